//! Wire-level tests for the Asaas client against a wiremock provider.

use billsync_asaas::{AsaasClient, AsaasConnector, DEFAULT_TIMEOUT};
use billsync_core::error::BillsyncError;
use billsync_core::gateway::{GatewayFactory, PaymentGateway};
use billsync_core::models::credential::ResolvedCredential;
use billsync_core::models::customer::{CustomerUpdate, NewCustomer};
use billsync_core::models::payment::{BillingType, ChargeQuery, ChargeUpdate, NewCharge};
use billsync_core::models::provider::ProviderCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "$aact_test_token";

async fn setup() -> (MockServer, AsaasClient) {
    let server = MockServer::start().await;
    let client = AsaasClient::new(&format!("{}/", server.uri()), &format!("Bearer {TOKEN}")).unwrap();
    (server, client)
}

#[tokio::test]
async fn create_customer_sends_auth_headers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v3/customers"))
        .and(header("access_token", TOKEN))
        .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_json(json!({
            "name": "ACME Ltda",
            "cpfCnpj": "12345678000190",
            "notificationDisabled": false,
            "company": true
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"object": "customer", "id": "cus_1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .create_customer(&NewCustomer {
            name: "ACME Ltda".into(),
            cpf_cnpj: "12345678000190".into(),
            company: true,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["id"], "cus_1");
}

#[tokio::test]
async fn non_success_status_is_returned_as_data() {
    let (server, client) = setup().await;
    let rejection = json!({"errors": [{"code": "invalid_value", "description": "Valor inválido"}]});

    Mock::given(method("POST"))
        .and(path("/v3/payments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(rejection.clone()))
        .mount(&server)
        .await;

    let resp = client
        .create_charge(&NewCharge {
            customer: "cus_1".into(),
            billing_type: BillingType::Boleto,
            value: Decimal::new(1, 2),
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: None,
            days_after_due_date_to_registration_cancellation: None,
            external_reference: None,
            installment_count: None,
            total_value: None,
            installment_value: None,
            discount: None,
            interest: None,
            fine: None,
            postal_service: None,
        })
        .await
        .unwrap();

    assert_eq!(resp.status, 400);
    assert_eq!(resp.json::<serde_json::Value>().unwrap(), rejection);
}

#[tokio::test]
async fn list_charges_forwards_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/payments"))
        .and(query_param("customer", "cus_1"))
        .and(query_param("installment", "ins_9"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list", "hasMore": false, "totalCount": 0, "limit": 100, "offset": 0, "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = ChargeQuery::new();
    query
        .set("customer", "cus_1")
        .set("limit", "100")
        .set("offset", "0")
        .set("installment", "ins_9");
    let resp = client.list_charges(&query).await.unwrap();
    assert!(resp.is_success());
}

#[tokio::test]
async fn charge_helpers_hit_their_endpoints() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/payments/pay_1/identificationField"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"identificationField": "0019..."})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/payments/pay_1/pixQrCode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": "000201..."})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v3/payments/pay_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true, "id": "pay_1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/payments/pay_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "pay_1"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.identification_field("pay_1").await.unwrap().status, 200);
    assert_eq!(client.pix_qr_code("pay_1").await.unwrap().status, 200);
    assert_eq!(client.delete_charge("pay_1").await.unwrap().status, 200);
    assert_eq!(client.get_charge("pay_1").await.unwrap().status, 200);
}

#[tokio::test]
async fn updates_use_put() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/v3/payments/pay_1"))
        .and(body_json(json!({"value": 99.9})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "pay_1", "value": 99.9})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v3/customers/cus_1"))
        .and(body_json(json!({"email": "billing@acme.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cus_1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/customers/cus_1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let update = ChargeUpdate {
        value: Some(Decimal::new(999, 1)),
        ..Default::default()
    };
    assert!(client.update_charge("pay_1", &update).await.unwrap().is_success());

    let update = CustomerUpdate {
        email: Some("billing@acme.test".into()),
        ..Default::default()
    };
    assert!(client.update_customer("cus_1", &update).await.unwrap().is_success());
    assert_eq!(client.get_customer("cus_1").await.unwrap().status, 404);
}

#[tokio::test]
async fn transport_failure_is_a_gateway_error() {
    // Nothing listens on this port once the server is dropped.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client = AsaasClient::new(&uri, TOKEN).unwrap();

    let err = client.pix_qr_code("pay_1").await.unwrap_err();
    assert!(matches!(err, BillsyncError::Gateway { .. }));
}

#[tokio::test]
async fn connector_binds_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/payments/pay_1/pixQrCode"))
        .and(header("access_token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"payload": "000201..."})))
        .expect(1)
        .mount(&server)
        .await;

    let connector = AsaasConnector::new(DEFAULT_TIMEOUT).unwrap();
    let credential = ResolvedCredential {
        id: Uuid::new_v4(),
        office_id: Uuid::new_v4(),
        provider: ProviderCode::asaas(),
        environment: Some("SANDBOX".into()),
        base_url: format!("{}/api/", server.uri()),
        token: TOKEN.into(),
        is_default: true,
    };
    let client = connector.connect(&credential).unwrap();
    assert!(client.pix_qr_code("pay_1").await.unwrap().is_success());
}

#[test]
fn connector_rejects_blank_token() {
    let connector = AsaasConnector::new(DEFAULT_TIMEOUT).unwrap();
    let credential = ResolvedCredential {
        id: Uuid::new_v4(),
        office_id: Uuid::new_v4(),
        provider: ProviderCode::asaas(),
        environment: None,
        base_url: "https://api.asaas.com".into(),
        token: "   ".into(),
        is_default: false,
    };
    assert!(matches!(
        connector.connect(&credential),
        Err(BillsyncError::Validation { .. })
    ));
}
