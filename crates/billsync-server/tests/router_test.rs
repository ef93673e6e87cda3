//! Router tests: the HTTP surface driven against the in-memory backend.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use billsync_core::models::credential::TenantCredential;
use billsync_core::models::customer::CompanyBillingProfile;
use billsync_core::models::provider::ProviderCode;
use billsync_mocks::{FailurePoint, MemoryBackend};
use billsync_server::{AppState, router};
use billsync_sync::SyncConfig;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::util::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "whsec_router_test";

struct TestApp {
    backend: MemoryBackend,
    app: Router,
    office_id: Uuid,
    company_id: Uuid,
    contract_id: Uuid,
}

async fn setup_with(config: SyncConfig) -> TestApp {
    let backend = MemoryBackend::new();
    let office_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();

    backend
        .store
        .add_credential(TenantCredential {
            id: Uuid::new_v4(),
            office_id,
            provider: ProviderCode::asaas(),
            environment: Some("sandbox".into()),
            base_url: Some("https://sandbox.asaas.com/api".into()),
            token: Some("$aact_router_token".into()),
            is_active: true,
            is_default: true,
            updated_at: Some(Utc::now()),
            created_at: Some(Utc::now()),
        })
        .await;
    backend
        .store
        .add_company(
            company_id,
            Uuid::new_v4(),
            Some(CompanyBillingProfile {
                name: "Escritorio Modelo LTDA".into(),
                cpf_cnpj: "11222333000181".into(),
                company: true,
                ..Default::default()
            }),
        )
        .await;

    TestApp {
        app: router(AppState::new(backend.clone(), config)),
        backend,
        office_id,
        company_id,
        contract_id: Uuid::new_v4(),
    }
}

async fn setup() -> TestApp {
    setup_with(SyncConfig {
        webhook_secret: Some(SECRET.into()),
        ..SyncConfig::default()
    })
    .await
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    fn charges_uri(&self) -> String {
        format!(
            "/v1/charges?office_id={}&company_id={}&contract_id={}",
            self.office_id, self.company_id, self.contract_id
        )
    }

    async fn create_pix_charge(&self) -> Value {
        let response = self
            .send(post_json(
                &self.charges_uri(),
                json!({"billingType": "PIX", "value": 150.00, "dueDate": "2025-03-10"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook_request(token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("asaas-access-token", token);
    }
    builder.body(body.into()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint() {
    let t = setup().await;

    let response = t
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn create_charge_returns_provider_body_and_persists_row() {
    let t = setup().await;

    let body = t.create_pix_charge().await;

    assert_eq!(body["billingType"], "PIX");
    let rows = t.backend.store.charges().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].provider_charge_id, body["id"].as_str().unwrap());
    assert_eq!(rows[0].value, Decimal::new(15000, 2));
}

#[tokio::test]
async fn create_charge_accepts_office_alias() {
    let t = setup().await;
    let uri = format!(
        "/v1/charges?accounting_office_id={}&company_id={}&contract_id={}",
        t.office_id, t.company_id, t.contract_id
    );

    let response = t
        .send(post_json(
            &uri,
            json!({"billingType": "BOLETO", "value": 99.9, "dueDate": "2025-04-01"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_charge_validation_error() {
    let t = setup().await;

    let response = t
        .send(post_json(
            &t.charges_uri(),
            json!({"value": 150.0, "dueDate": "2025-03-10"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "billingType is required"})
    );
}

#[tokio::test]
async fn create_charge_requires_contract() {
    let t = setup().await;
    let uri = format!(
        "/v1/charges?office_id={}&company_id={}",
        t.office_id, t.company_id
    );

    let response = t
        .send(post_json(&uri, json!({"billingType": "PIX"})))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "contract_id is required");
}

#[tokio::test]
async fn persist_failure_is_bad_gateway_with_request_id() {
    let t = setup().await;
    t.backend.store.fail(FailurePoint::ChargeUpsert).await;

    let response = t
        .send(post_json(
            &t.charges_uri(),
            json!({"billingType": "PIX", "value": 150.0, "dueDate": "2025-03-10"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "failed to persist charges");
    assert_eq!(body["request_id"].as_str().unwrap().len(), 12);
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn debug_mode_exposes_details() {
    let t = setup_with(SyncConfig {
        debug: true,
        ..SyncConfig::default()
    })
    .await;
    t.backend.store.fail(FailurePoint::ChargeUpsert).await;

    let response = t
        .send(post_json(
            &t.charges_uri(),
            json!({"billingType": "PIX", "value": 150.0, "dueDate": "2025-03-10"}),
        ))
        .await;

    let body = body_json(response).await;
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn unknown_office_is_not_found() {
    let t = setup().await;
    let uri = format!(
        "/v1/charges?office_id={}&company_id={}&contract_id={}",
        Uuid::new_v4(),
        t.company_id,
        t.contract_id
    );

    let response = t
        .send(post_json(
            &uri,
            json!({"billingType": "PIX", "value": 150.0, "dueDate": "2025-03-10"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "billing integration not found for office/provider"
    );
}

#[tokio::test]
async fn delete_charge_reports_success() {
    let t = setup().await;
    let created = t.create_pix_charge().await;
    let id = created["id"].as_str().unwrap();
    t.backend.store.fail(FailurePoint::ChargeDelete).await;

    let response = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/charges/{id}?office_id={}", t.office_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"success": true, "message": "Cobrança excluída com sucesso", "id": id})
    );
}

#[tokio::test]
async fn get_charge_reads_through() {
    let t = setup().await;
    let created = t.create_pix_charge().await;
    let id = created["id"].as_str().unwrap();

    let response = t
        .send(
            Request::builder()
                .uri(format!("/v1/charges/{id}?office_id={}", t.office_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], id);
}

#[tokio::test]
async fn provider_rejection_is_forwarded_verbatim() {
    let t = setup().await;

    let response = t
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/charges/pay_missing?office_id={}", t.office_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["code"], "not_found");
}

#[tokio::test]
async fn list_rejects_bad_limit() {
    let t = setup().await;

    let response = t
        .send(
            Request::builder()
                .uri(format!("/v1/charges?office_id={}&limit=abc", t.office_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "limit must be an integer between 0 and 100"
    );
}

#[tokio::test]
async fn list_by_company_returns_provider_page() {
    let t = setup().await;
    t.create_pix_charge().await;

    let response = t
        .send(
            Request::builder()
                .uri(format!(
                    "/v1/charges?office_id={}&company_id={}&status=PENDING",
                    t.office_id, t.company_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["object"], "list");
    assert_eq!(page["totalCount"], 1);
}

#[tokio::test]
async fn customer_conflict_includes_existing_id() {
    let t = setup().await;
    t.backend
        .store
        .add_mapping(t.company_id, "cus_000000000042")
        .await;

    let response = t
        .send(post_json(
            &format!(
                "/v1/customers?office_id={}&company_id={}",
                t.office_id, t.company_id
            ),
            json!({"name": "Escritorio Modelo LTDA", "cpfCnpj": "11222333000181"}),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "asaas integration already exists for this company (current tenant)",
            "asaas_customer_id": "cus_000000000042"
        })
    );
}

#[tokio::test]
async fn customer_by_company_routes_before_id() {
    let t = setup().await;

    let response = t
        .send(
            Request::builder()
                .uri(format!(
                    "/v1/customers/by-company?office_id={}&company_id={}",
                    t.office_id, t.company_id
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "asaas integration not found for this company (current tenant)"
    );
}

#[tokio::test]
async fn empty_customer_update_is_rejected() {
    let t = setup().await;

    let response = t
        .send(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/customers/cus_000000000001?office_id={}", t.office_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name": "  "}"#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "at least one field is required to update"
    );
}

#[tokio::test]
async fn webhook_requires_secret() {
    let t = setup().await;

    let response = t
        .send(webhook_request(Some("wrong"), r#"{"event": "PAYMENT_RECEIVED"}"#))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn webhook_rejects_invalid_json() {
    let t = setup().await;

    let response = t.send(webhook_request(Some(SECRET), "{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({"error": "Invalid JSON"}));
}

#[tokio::test]
async fn webhook_for_unknown_charge_is_acknowledged() {
    let t = setup().await;
    let event = json!({
        "id": "evt_1",
        "event": "PAYMENT_RECEIVED",
        "payment": {"id": "pay_999999999999", "status": "RECEIVED"}
    });

    let response = t
        .send(webhook_request(Some(SECRET), event.to_string()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"received": true, "processed": false, "reason": "charge_not_found"})
    );
    assert_eq!(t.backend.store.upsert_calls().await, 0);
}

#[tokio::test]
async fn webhook_with_undecodable_payment_is_acknowledged() {
    let t = setup().await;
    let event = json!({
        "id": "evt_3",
        "event": "PAYMENT_UPDATED",
        "payment": {"id": "pay_000000000001", "dueDate": "not-a-date"}
    });

    let response = t
        .send(webhook_request(Some(SECRET), event.to_string()))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"received": true, "processed": false, "reason": "invalid_payment_object"})
    );
}

#[tokio::test]
async fn paid_webhook_updates_the_row() {
    let t = setup().await;
    let created = t.create_pix_charge().await;
    let id = created["id"].as_str().unwrap();
    let mut payment = created.clone();
    payment["status"] = json!("RECEIVED");
    let event = json!({"id": "evt_2", "event": "PAYMENT_RECEIVED", "payment": payment});

    let response = t
        .send(
            Request::builder()
                .method("POST")
                .uri("/asaas/feecharges")
                .header("asaas-access-token", SECRET)
                .body(Body::from(event.to_string()))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"received": true, "processed": true, "payment_id": id, "status": "RECEIVED"})
    );
    let rows = t.backend.store.charges().await;
    assert_eq!(rows[0].status.as_deref(), Some("RECEIVED"));
    assert_eq!(rows[0].contract_id, t.contract_id);
}
