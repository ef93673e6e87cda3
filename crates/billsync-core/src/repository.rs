//! Repository trait definitions for the tenant data store.
//!
//! All repository operations are async. Implementations talk to the
//! PostgREST backend in `billsync-db`; tests use the in-memory doubles in
//! `billsync-mocks`.

use uuid::Uuid;

use crate::error::BillsyncResult;
use crate::gateway::GatewayFactory;
use crate::models::{
    charge::Charge, credential::TenantCredential, customer::CompanyBillingProfile,
    provider::ProviderCode,
};

/// Read access to provider credentials configured per office.
pub trait CredentialRepository: Send + Sync {
    /// All active credentials for the office and provider, in no
    /// particular order.
    fn list_active(
        &self,
        office_id: Uuid,
        provider: &ProviderCode,
    ) -> impl Future<Output = BillsyncResult<Vec<TenantCredential>>> + Send;
}

/// Company to provider customer id mapping.
pub trait CustomerMappingRepository: Send + Sync {
    fn find(&self, company_id: Uuid) -> impl Future<Output = BillsyncResult<Option<String>>> + Send;
    fn save(
        &self,
        company_id: Uuid,
        provider_customer_id: &str,
    ) -> impl Future<Output = BillsyncResult<()>> + Send;
}

/// Company lookups owned by the tenant data store.
pub trait CompanyDirectory: Send + Sync {
    /// Tenant currently owning the company.
    fn tenant_of(&self, company_id: Uuid) -> impl Future<Output = BillsyncResult<Uuid>> + Send;
    /// Data needed to register the company as a provider customer.
    fn billing_profile(
        &self,
        company_id: Uuid,
    ) -> impl Future<Output = BillsyncResult<Option<CompanyBillingProfile>>> + Send;
}

pub trait ChargeRepository: Send + Sync {
    /// Insert or overwrite rows keyed on
    /// `(tenant_id, provider, provider_charge_id)`.
    fn upsert(&self, charges: &[Charge]) -> impl Future<Output = BillsyncResult<()>> + Send;
    fn find_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<Option<Charge>>> + Send;
    fn delete_by_provider_id(
        &self,
        provider: &ProviderCode,
        provider_charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<()>> + Send;
}

/// Bundle of every collaborator the synchronization services need.
///
/// Services and HTTP handlers are generic over a single `Backend` instead
/// of one type parameter per repository.
pub trait Backend: Clone + Send + Sync + 'static {
    type Credentials: CredentialRepository;
    type Mappings: CustomerMappingRepository;
    type Companies: CompanyDirectory;
    type Charges: ChargeRepository;
    type Connector: GatewayFactory;

    fn credentials(&self) -> &Self::Credentials;
    fn mappings(&self) -> &Self::Mappings;
    fn companies(&self) -> &Self::Companies;
    fn charges(&self) -> &Self::Charges;
    fn connector(&self) -> &Self::Connector;
}
