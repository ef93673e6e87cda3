//! Shared fixture for service tests: one office with an Asaas credential
//! and one company with billing data, all in memory.

#![allow(dead_code)]

use billsync_core::models::charge::Charge;
use billsync_core::models::credential::TenantCredential;
use billsync_core::models::customer::CompanyBillingProfile;
use billsync_core::models::payment::{BillingType, NewChargeRequest};
use billsync_core::models::provider::ProviderCode;
use billsync_mocks::MemoryBackend;
use billsync_sync::{ChargeService, NewChargeInput, SyncConfig};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct Fixture {
    pub backend: MemoryBackend,
    pub office_id: Uuid,
    pub company_id: Uuid,
    pub tenant_id: Uuid,
    pub contract_id: Uuid,
    pub credential_id: Uuid,
}

pub fn credential(office_id: Uuid) -> TenantCredential {
    TenantCredential {
        id: Uuid::new_v4(),
        office_id,
        provider: ProviderCode::asaas(),
        environment: Some("sandbox".into()),
        base_url: Some("https://sandbox.asaas.com/api".into()),
        token: Some("$aact_test_token_1234".into()),
        is_active: true,
        is_default: true,
        updated_at: Some(Utc::now()),
        created_at: Some(Utc::now()),
    }
}

pub fn profile() -> CompanyBillingProfile {
    CompanyBillingProfile {
        name: "Padaria Pao Quente LTDA".into(),
        cpf_cnpj: "12345678000199".into(),
        email: Some("financeiro@paoquente.com.br".into()),
        mobile_phone: None,
        company: true,
        notification_disabled: false,
    }
}

pub async fn setup() -> Fixture {
    let backend = MemoryBackend::new();
    let office_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();
    let tenant_id = Uuid::new_v4();

    let credential = credential(office_id);
    let credential_id = credential.id;
    backend.store.add_credential(credential).await;
    backend
        .store
        .add_company(company_id, tenant_id, Some(profile()))
        .await;

    Fixture {
        backend,
        office_id,
        company_id,
        tenant_id,
        contract_id: Uuid::new_v4(),
        credential_id,
    }
}

impl Fixture {
    pub fn charges(&self) -> ChargeService<MemoryBackend> {
        ChargeService::new(self.backend.clone(), SyncConfig::default())
    }

    pub fn input(&self, request: NewChargeRequest) -> NewChargeInput {
        NewChargeInput {
            office_id: self.office_id,
            company_id: self.company_id,
            contract_id: self.contract_id,
            request,
        }
    }

    /// Create a PIX charge of 150.00 due 2025-03-10 and return its row.
    pub async fn create_pix_charge(&self) -> Charge {
        let created = self
            .charges()
            .create(self.input(pix_request()))
            .await
            .unwrap();
        assert_eq!(created.charges.len(), 1);
        created.charges.into_iter().next().unwrap()
    }
}

pub fn pix_request() -> NewChargeRequest {
    NewChargeRequest {
        billing_type: Some(BillingType::Pix),
        value: Some(Decimal::new(15000, 2)),
        due_date: NaiveDate::from_ymd_opt(2025, 3, 10),
        description: Some("Honorarios contabeis marco/2025".into()),
        ..Default::default()
    }
}
