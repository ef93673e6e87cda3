//! PostgREST implementation of [`ChargeRepository`].

use billsync_core::error::BillsyncResult;
use billsync_core::models::charge::Charge;
use billsync_core::models::provider::ProviderCode;
use billsync_core::repository::ChargeRepository;
use tracing::debug;

use super::eq;
use crate::connection::{Schema, StoreClient};

const TABLE: &str = "charges";
const ON_CONFLICT: &str = "tenant_id,provider,provider_charge_id";

#[derive(Clone)]
pub struct RestChargeRepository {
    store: StoreClient,
}

impl RestChargeRepository {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }
}

impl ChargeRepository for RestChargeRepository {
    async fn upsert(&self, charges: &[Charge]) -> BillsyncResult<()> {
        if charges.is_empty() {
            return Ok(());
        }
        debug!(rows = charges.len(), "Upserting charges");
        self.store
            .upsert(Schema::Iam, TABLE, ON_CONFLICT, charges)
            .await?;
        Ok(())
    }

    async fn find_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> BillsyncResult<Option<Charge>> {
        let rows: Vec<Charge> = self
            .store
            .select(
                Schema::Iam,
                TABLE,
                &[
                    ("select", "*".to_string()),
                    ("provider", eq(provider)),
                    ("provider_charge_id", eq(provider_charge_id)),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> BillsyncResult<()> {
        self.store
            .delete(
                Schema::Iam,
                TABLE,
                &[
                    ("provider", eq(provider)),
                    ("provider_charge_id", eq(provider_charge_id)),
                ],
            )
            .await?;
        Ok(())
    }
}
