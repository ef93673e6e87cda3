//! PostgREST implementation of [`CustomerMappingRepository`].
//!
//! The mapping lives in the `company` schema, which is not exposed through
//! PostgREST; access goes through RPCs that resolve the company's current
//! tenant server-side.

use billsync_core::error::BillsyncResult;
use billsync_core::repository::CustomerMappingRepository;
use serde_json::json;
use uuid::Uuid;

use crate::connection::StoreClient;

const GET_RPC: &str = "rpc_get_company_asaas_customer_id";
const UPSERT_RPC: &str = "rpc_upsert_company_asaas_integration";

#[derive(Clone)]
pub struct RestCustomerMappingRepository {
    store: StoreClient,
}

impl RestCustomerMappingRepository {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }
}

impl CustomerMappingRepository for RestCustomerMappingRepository {
    async fn find(&self, company_id: Uuid) -> BillsyncResult<Option<String>> {
        let raw = self
            .store
            .rpc(GET_RPC, &json!({ "p_company_id": company_id }))
            .await?;
        Ok(parse_customer_id(&raw))
    }

    async fn save(&self, company_id: Uuid, provider_customer_id: &str) -> BillsyncResult<()> {
        self.store
            .rpc(
                UPSERT_RPC,
                &json!({
                    "p_company_id": company_id,
                    "p_asaas_customer_id": provider_customer_id,
                }),
            )
            .await?;
        Ok(())
    }
}

/// The RPC answers with a JSON string, `null`, or occasionally a bare
/// unquoted id.
fn parse_customer_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "null" {
        return None;
    }
    let id = match serde_json::from_str::<Option<String>>(raw) {
        Ok(parsed) => parsed?,
        Err(_) => raw.trim_matches('"').to_string(),
    };
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}
