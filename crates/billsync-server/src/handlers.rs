//! HTTP handlers.
//!
//! Provider answers are written back verbatim; everything else is JSON.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use billsync_core::models::customer::{CustomerUpdate, NewCustomer};
use billsync_core::models::payment::{ChargeUpdate, NewChargeRequest};
use billsync_core::models::webhook::{WebhookEvent, WebhookOutcome};
use billsync_core::repository::Backend;
use billsync_sync::NewChargeInput;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, provider_response};
use crate::state::AppState;

type Params = HashMap<String, String>;

const OFFICE_KEYS: &[&str] = &["office_id", "accounting_office_id"];
const COMPANY_KEYS: &[&str] = &["company_id"];
const CONTRACT_KEYS: &[&str] = &["contract_id"];

/// Header carrying the webhook shared secret.
pub const WEBHOOK_TOKEN_HEADER: &str = "asaas-access-token";

fn param<'a>(params: &'a Params, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| params.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

fn optional_uuid(params: &Params, keys: &[&str]) -> ApiResult<Option<Uuid>> {
    param(params, keys)
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| ApiError::bad_request(format!("{} must be a valid UUID", keys[0])))
        })
        .transpose()
}

fn required_uuid(params: &Params, keys: &[&str]) -> ApiResult<Uuid> {
    optional_uuid(params, keys)?
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", keys[0])))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

pub async fn create_customer<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<Params>,
    body: Bytes,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let company_id = required_uuid(&params, COMPANY_KEYS)?;
    let input: NewCustomer = parse_body(&body)?;

    let response = state
        .customers
        .create_for_company(office_id, company_id, input)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn get_customer<B: Backend>(
    State(state): State<AppState<B>>,
    Path(customer_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let response = state
        .customers
        .get_by_id(office_id, &customer_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn get_customer_by_company<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let company_id = required_uuid(&params, COMPANY_KEYS)?;
    let response = state
        .customers
        .get_by_company(office_id, company_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn update_customer<B: Backend>(
    State(state): State<AppState<B>>,
    Path(customer_id): Path<String>,
    Query(params): Query<Params>,
    body: Bytes,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let update: CustomerUpdate = parse_body(&body)?;
    let response = state
        .customers
        .update_by_id(office_id, &customer_id, update)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn update_customer_by_company<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<Params>,
    body: Bytes,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let company_id = required_uuid(&params, COMPANY_KEYS)?;
    let update: CustomerUpdate = parse_body(&body)?;
    let response = state
        .customers
        .update_by_company(office_id, company_id, update)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn create_charge<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<Params>,
    body: Bytes,
) -> ApiResult<Response> {
    let input = NewChargeInput {
        office_id: required_uuid(&params, OFFICE_KEYS)?,
        company_id: required_uuid(&params, COMPANY_KEYS)?,
        contract_id: required_uuid(&params, CONTRACT_KEYS)?,
        request: parse_body::<NewChargeRequest>(&body)?,
    };

    let created = state
        .charges
        .create(input)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(created.response))
}

pub async fn list_charges<B: Backend>(
    State(state): State<AppState<B>>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let company_id = optional_uuid(&params, COMPANY_KEYS)?;
    let response = state
        .charges
        .list(office_id, company_id, &params)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn get_charge<B: Backend>(
    State(state): State<AppState<B>>,
    Path(charge_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let response = state
        .charges
        .get(office_id, &charge_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn update_charge<B: Backend>(
    State(state): State<AppState<B>>,
    Path(charge_id): Path<String>,
    Query(params): Query<Params>,
    body: Bytes,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let update: ChargeUpdate = parse_body(&body)?;
    let response = state
        .charges
        .update(office_id, &charge_id, update)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn delete_charge<B: Backend>(
    State(state): State<AppState<B>>,
    Path(charge_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let deleted = state
        .charges
        .delete(office_id, &charge_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(json!({
        "success": true,
        "message": "Cobrança excluída com sucesso",
        "id": deleted.id,
    }))
    .into_response())
}

pub async fn digitable_line<B: Backend>(
    State(state): State<AppState<B>>,
    Path(charge_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let response = state
        .charges
        .digitable_line(office_id, &charge_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

pub async fn pix_qr_code<B: Backend>(
    State(state): State<AppState<B>>,
    Path(charge_id): Path<String>,
    Query(params): Query<Params>,
) -> ApiResult<Response> {
    let office_id = required_uuid(&params, OFFICE_KEYS)?;
    let response = state
        .charges
        .pix_qr_code(office_id, &charge_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(provider_response(response))
}

/// Provider notifications. Authenticated by shared secret, then applied
/// to the matching charge row.
pub async fn webhook<B: Backend>(
    State(state): State<AppState<B>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let presented = headers
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    state
        .webhooks
        .authorize(presented)
        .map_err(|e| state.reject(e))?;

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Invalid webhook payload");
        ApiError::bad_request("Invalid JSON")
    })?;

    let outcome = state
        .webhooks
        .ingest(event)
        .await
        .map_err(|e| state.reject(e))?;

    let body = match outcome {
        WebhookOutcome::Processed { payment_id, status } => json!({
            "received": true,
            "processed": true,
            "payment_id": payment_id,
            "status": status,
        }),
        WebhookOutcome::Skipped { reason } => json!({
            "received": true,
            "processed": false,
            "reason": reason.as_str(),
        }),
    };
    Ok(Json(body).into_response())
}
