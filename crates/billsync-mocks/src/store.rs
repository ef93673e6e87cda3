//! In-memory tenant data store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use billsync_core::error::{BillsyncError, BillsyncResult};
use billsync_core::models::charge::Charge;
use billsync_core::models::credential::TenantCredential;
use billsync_core::models::customer::CompanyBillingProfile;
use billsync_core::models::provider::ProviderCode;
use billsync_core::repository::{
    ChargeRepository, CompanyDirectory, CredentialRepository, CustomerMappingRepository,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Operations that can be configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    CredentialLookup,
    MappingLookup,
    MappingSave,
    TenantLookup,
    ProfileLookup,
    ChargeUpsert,
    ChargeLookup,
    ChargeDelete,
}

type ChargeKey = (Uuid, ProviderCode, String);

#[derive(Default)]
struct State {
    credentials: Vec<TenantCredential>,
    mappings: HashMap<Uuid, String>,
    tenants: HashMap<Uuid, Uuid>,
    profiles: HashMap<Uuid, CompanyBillingProfile>,
    charges: HashMap<ChargeKey, Charge>,
    failures: HashSet<FailurePoint>,
    upsert_calls: usize,
    delete_calls: usize,
    mapping_saves: usize,
}

/// In-memory data store shared by clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_credential(&self, credential: TenantCredential) {
        self.state.write().await.credentials.push(credential);
    }

    /// Register a company under a tenant, optionally with billing data.
    pub async fn add_company(
        &self,
        company_id: Uuid,
        tenant_id: Uuid,
        profile: Option<CompanyBillingProfile>,
    ) {
        let mut state = self.state.write().await;
        state.tenants.insert(company_id, tenant_id);
        if let Some(profile) = profile {
            state.profiles.insert(company_id, profile);
        }
    }

    pub async fn add_mapping(&self, company_id: Uuid, provider_customer_id: &str) {
        self.state
            .write()
            .await
            .mappings
            .insert(company_id, provider_customer_id.to_string());
    }

    pub async fn mapping(&self, company_id: Uuid) -> Option<String> {
        self.state.read().await.mappings.get(&company_id).cloned()
    }

    /// Insert a charge row directly, bypassing failure toggles and counters.
    pub async fn seed_charge(&self, charge: Charge) {
        let key = key_of(&charge);
        self.state.write().await.charges.insert(key, charge);
    }

    /// All charge rows, ordered by installment number then provider id.
    pub async fn charges(&self) -> Vec<Charge> {
        let mut rows: Vec<Charge> = self.state.read().await.charges.values().cloned().collect();
        rows.sort_by(|a, b| {
            (a.installment_number, &a.provider_charge_id)
                .cmp(&(b.installment_number, &b.provider_charge_id))
        });
        rows
    }

    pub async fn charge_count(&self) -> usize {
        self.state.read().await.charges.len()
    }

    pub async fn fail(&self, point: FailurePoint) {
        self.state.write().await.failures.insert(point);
    }

    pub async fn recover(&self, point: FailurePoint) {
        self.state.write().await.failures.remove(&point);
    }

    /// Number of upsert calls that reached the store, failed or not.
    pub async fn upsert_calls(&self) -> usize {
        self.state.read().await.upsert_calls
    }

    pub async fn delete_calls(&self) -> usize {
        self.state.read().await.delete_calls
    }

    pub async fn mapping_saves(&self) -> usize {
        self.state.read().await.mapping_saves
    }

    async fn check(&self, point: FailurePoint) -> BillsyncResult<()> {
        if self.state.read().await.failures.contains(&point) {
            return Err(BillsyncError::gateway(format!(
                "mock store configured to fail: {point:?}"
            )));
        }
        Ok(())
    }
}

fn key_of(charge: &Charge) -> ChargeKey {
    (
        charge.tenant_id,
        charge.provider.clone(),
        charge.provider_charge_id.clone(),
    )
}

impl CredentialRepository for MemoryStore {
    async fn list_active(
        &self,
        office_id: Uuid,
        provider: &ProviderCode,
    ) -> BillsyncResult<Vec<TenantCredential>> {
        self.check(FailurePoint::CredentialLookup).await?;
        Ok(self
            .state
            .read()
            .await
            .credentials
            .iter()
            .filter(|c| c.office_id == office_id && &c.provider == provider && c.is_active)
            .cloned()
            .collect())
    }
}

impl CustomerMappingRepository for MemoryStore {
    async fn find(&self, company_id: Uuid) -> BillsyncResult<Option<String>> {
        self.check(FailurePoint::MappingLookup).await?;
        Ok(self.mapping(company_id).await)
    }

    async fn save(&self, company_id: Uuid, provider_customer_id: &str) -> BillsyncResult<()> {
        let mut state = self.state.write().await;
        state.mapping_saves += 1;
        if state.failures.contains(&FailurePoint::MappingSave) {
            return Err(BillsyncError::gateway("mock store configured to fail: MappingSave"));
        }
        state
            .mappings
            .insert(company_id, provider_customer_id.to_string());
        Ok(())
    }
}

impl CompanyDirectory for MemoryStore {
    async fn tenant_of(&self, company_id: Uuid) -> BillsyncResult<Uuid> {
        self.check(FailurePoint::TenantLookup).await?;
        self.state
            .read()
            .await
            .tenants
            .get(&company_id)
            .copied()
            .ok_or_else(|| BillsyncError::not_found("company tenant", company_id))
    }

    async fn billing_profile(
        &self,
        company_id: Uuid,
    ) -> BillsyncResult<Option<CompanyBillingProfile>> {
        self.check(FailurePoint::ProfileLookup).await?;
        Ok(self.state.read().await.profiles.get(&company_id).cloned())
    }
}

impl ChargeRepository for MemoryStore {
    async fn upsert(&self, charges: &[Charge]) -> BillsyncResult<()> {
        let mut state = self.state.write().await;
        state.upsert_calls += 1;
        if state.failures.contains(&FailurePoint::ChargeUpsert) {
            return Err(BillsyncError::gateway("mock store configured to fail: ChargeUpsert"));
        }
        for charge in charges {
            state.charges.insert(key_of(charge), charge.clone());
        }
        Ok(())
    }

    async fn find_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> BillsyncResult<Option<Charge>> {
        self.check(FailurePoint::ChargeLookup).await?;
        Ok(self
            .state
            .read()
            .await
            .charges
            .values()
            .find(|c| &c.provider == provider && c.provider_charge_id == provider_charge_id)
            .cloned())
    }

    async fn delete_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> BillsyncResult<()> {
        let mut state = self.state.write().await;
        state.delete_calls += 1;
        if state.failures.contains(&FailurePoint::ChargeDelete) {
            return Err(BillsyncError::gateway("mock store configured to fail: ChargeDelete"));
        }
        state
            .charges
            .retain(|_, c| !(&c.provider == provider && c.provider_charge_id == provider_charge_id));
        Ok(())
    }
}
