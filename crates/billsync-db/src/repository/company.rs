//! PostgREST implementation of [`CompanyDirectory`].

use billsync_core::error::BillsyncResult;
use billsync_core::models::customer::CompanyBillingProfile;
use billsync_core::repository::CompanyDirectory;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::eq;
use crate::connection::{Schema, StoreClient};
use crate::error::StoreError;

const PROFILE_RPC: &str = "rpc_get_company_asaas_customer_payload";

#[derive(Debug, Deserialize)]
struct CompanyTenantRow {
    #[serde(default)]
    tenant_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct RestCompanyDirectory {
    store: StoreClient,
}

impl RestCompanyDirectory {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }
}

impl CompanyDirectory for RestCompanyDirectory {
    async fn tenant_of(&self, company_id: Uuid) -> BillsyncResult<Uuid> {
        let rows: Vec<CompanyTenantRow> = self
            .store
            .select(
                Schema::Company,
                "companies",
                &[
                    ("select", "id,tenant_id".to_string()),
                    ("id", eq(company_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        let tenant_id = rows
            .into_iter()
            .next()
            .and_then(|row| row.tenant_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "company tenant".into(),
                id: company_id.to_string(),
            })?;
        Ok(tenant_id)
    }

    async fn billing_profile(
        &self,
        company_id: Uuid,
    ) -> BillsyncResult<Option<CompanyBillingProfile>> {
        let raw = self
            .store
            .rpc(PROFILE_RPC, &json!({ "p_company_id": company_id }))
            .await?;
        if raw.is_empty() || raw == "null" {
            return Ok(None);
        }

        let profile = serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            operation: format!("rpc {PROFILE_RPC}"),
            source,
        })?;
        Ok(Some(profile))
    }
}
