//! Error types for the billsync system.

use thiserror::Error;

use crate::gateway::ProviderResponse;

#[derive(Debug, Error)]
pub enum BillsyncError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} with id {id}")]
    AlreadyExists { entity: String, id: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// A downstream call (provider or tenant data store) failed or
    /// returned an unexpected shape.
    #[error("Gateway failure: {message}")]
    Gateway {
        message: String,
        details: Option<String>,
        request_id: Option<String>,
    },

    /// The provider answered with a non-2xx status. The response is
    /// forwarded to the caller untouched.
    #[error("Provider rejected the request with status {}", .0.status)]
    ProviderRejected(ProviderResponse),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillsyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            details: None,
            request_id: None,
        }
    }

    /// Attach the underlying cause to a gateway failure.
    pub fn with_details(self, cause: impl ToString) -> Self {
        match self {
            Self::Gateway {
                message,
                request_id,
                ..
            } => Self::Gateway {
                message,
                details: Some(cause.to_string()),
                request_id,
            },
            other => other,
        }
    }

    /// Attach a correlation id to a gateway failure.
    pub fn with_request_id(self, id: impl Into<String>) -> Self {
        match self {
            Self::Gateway {
                message, details, ..
            } => Self::Gateway {
                message,
                details,
                request_id: Some(id.into()),
            },
            other => other,
        }
    }
}

pub type BillsyncResult<T> = Result<T, BillsyncError>;
