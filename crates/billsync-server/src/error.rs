//! HTTP error mapping.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use billsync_core::error::BillsyncError;
use billsync_core::gateway::ProviderResponse;
use serde::Serialize;
use thiserror::Error;

const CUSTOMER_CONFLICT: &str = "asaas integration already exists for this company (current tenant)";

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{}", CUSTOMER_CONFLICT)]
    CustomerConflict { provider_customer_id: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    BadGateway {
        message: String,
        details: Option<String>,
        request_id: Option<String>,
    },

    /// Non-2xx provider answer, written back unchanged.
    #[error("provider answered with status {}", .0.status)]
    Provider(ProviderResponse),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    asaas_customer_id: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Map a service error. `details` are only kept in debug mode.
    pub fn from_service(err: BillsyncError, debug: bool) -> Self {
        match err {
            BillsyncError::Validation { message } => Self::BadRequest { message },
            BillsyncError::NotFound { entity, id } => Self::NotFound {
                message: not_found_message(&entity, &id),
            },
            BillsyncError::AlreadyExists { id, .. } => Self::CustomerConflict {
                provider_customer_id: id,
            },
            BillsyncError::Unauthorized { .. } => Self::Unauthorized,
            BillsyncError::Gateway {
                message,
                details,
                request_id,
            } => Self::BadGateway {
                message,
                details: details.filter(|_| debug),
                request_id,
            },
            BillsyncError::ProviderRejected(response) => Self::Provider(response),
            BillsyncError::Internal(message) => Self::Internal(message),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::CustomerConflict { .. } => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::Provider(response) => {
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn not_found_message(entity: &str, id: &str) -> String {
    match entity {
        "billing integration" => "billing integration not found for office/provider".into(),
        "customer mapping" => "asaas integration not found for this company (current tenant)".into(),
        "company" => "company not found to create asaas customer".into(),
        _ => format!("{entity} not found: {id}"),
    }
}

/// Write a provider answer back with its own status and body.
pub fn provider_response(response: ProviderResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        response.body,
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Provider(response) => return provider_response(response),
            Self::CustomerConflict {
                provider_customer_id,
            } => ErrorBody {
                error: CUSTOMER_CONFLICT.into(),
                request_id: None,
                details: None,
                asaas_customer_id: Some(provider_customer_id),
            },
            Self::BadGateway {
                message,
                details,
                request_id,
            } => ErrorBody {
                error: message,
                request_id,
                details,
                asaas_customer_id: None,
            },
            other => ErrorBody {
                error: other.to_string(),
                request_id: None,
                details: None,
                asaas_customer_id: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
