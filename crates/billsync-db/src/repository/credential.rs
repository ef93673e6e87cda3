//! PostgREST implementation of [`CredentialRepository`].

use billsync_core::error::BillsyncResult;
use billsync_core::models::credential::TenantCredential;
use billsync_core::models::provider::ProviderCode;
use billsync_core::repository::CredentialRepository;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::eq;
use crate::connection::{Schema, StoreClient};

const TABLE: &str = "billing_integrations";
const COLUMNS: &str =
    "id,accounting_office_id,provider,environment,base_api,token,is_active,is_default,updated_at,created_at";

/// Row as stored in `iam.billing_integrations`.
#[derive(Debug, Deserialize)]
struct BillingIntegrationRow {
    id: Uuid,
    accounting_office_id: Uuid,
    provider: String,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    base_api: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    is_default: Option<bool>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl BillingIntegrationRow {
    fn into_credential(self) -> TenantCredential {
        TenantCredential {
            id: self.id,
            office_id: self.accounting_office_id,
            provider: ProviderCode::normalize(&self.provider),
            environment: self.environment,
            base_url: self.base_api,
            token: self.token,
            is_active: self.is_active.unwrap_or(false),
            is_default: self.is_default.unwrap_or(false),
            updated_at: self.updated_at,
            created_at: self.created_at,
        }
    }
}

/// PostgREST implementation of the credential repository.
#[derive(Clone)]
pub struct RestCredentialRepository {
    store: StoreClient,
}

impl RestCredentialRepository {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }
}

impl CredentialRepository for RestCredentialRepository {
    async fn list_active(
        &self,
        office_id: Uuid,
        provider: &ProviderCode,
    ) -> BillsyncResult<Vec<TenantCredential>> {
        let rows: Vec<BillingIntegrationRow> = self
            .store
            .select(
                Schema::Iam,
                TABLE,
                &[
                    ("select", COLUMNS.to_string()),
                    ("accounting_office_id", eq(office_id)),
                    ("provider", eq(provider)),
                    ("is_active", eq(true)),
                    (
                        "order",
                        "is_default.desc,updated_at.desc.nullslast,created_at.desc.nullslast"
                            .to_string(),
                    ),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(BillingIntegrationRow::into_credential)
            .collect())
    }
}
