//! Customer identity mapping: internal company to provider customer.

use billsync_core::error::{BillsyncError, BillsyncResult};
use billsync_core::gateway::{PaymentGateway, ProviderResponse};
use billsync_core::models::customer::{CustomerUpdate, NewCustomer, ProviderCustomer};
use billsync_core::repository::{Backend, CompanyDirectory, CustomerMappingRepository};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::credentials::connect_gateway;
use crate::error::SyncError;
use crate::{required_id, token};

/// Customer identity service.
///
/// The mapping is created at most once per company and never updated.
/// Creating it is not atomic with the provider call: a provider customer
/// whose mapping failed to persist is orphaned and reported with a
/// correlation id.
#[derive(Clone)]
pub struct CustomerService<B: Backend> {
    backend: B,
    config: SyncConfig,
}

impl<B: Backend> CustomerService<B> {
    pub fn new(backend: B, config: SyncConfig) -> Self {
        Self { backend, config }
    }

    /// Look up the provider customer id of a company.
    pub async fn resolve(&self, company_id: Uuid) -> BillsyncResult<Option<String>> {
        self.backend.mappings().find(company_id).await.map_err(|e| {
            warn!(%company_id, error = %e, "Failed to resolve provider customer id");
            BillsyncError::gateway("failed to resolve asaas customer id").with_details(e)
        })
    }

    /// Return the company's provider customer id, registering the company
    /// with the provider first if it has none.
    pub async fn get_or_create<G: PaymentGateway>(
        &self,
        gateway: &G,
        company_id: Uuid,
        request_id: &str,
    ) -> BillsyncResult<String> {
        // 1. Existing mapping.
        if let Some(existing) = self.resolve(company_id).await? {
            return Ok(existing);
        }

        // 2. Load the billing profile.
        info!(request_id, %company_id, "No customer mapping, creating provider customer");
        let profile = self
            .backend
            .companies()
            .billing_profile(company_id)
            .await
            .map_err(|e| {
                error!(request_id, %company_id, error = %e, "Failed to load company billing profile");
                BillsyncError::gateway("failed to load company data to create asaas customer")
                    .with_details(e)
            })?
            .ok_or(SyncError::CompanyNotFound { company_id })?;

        let customer = profile.into_new_customer();
        if !customer.has_required_fields() {
            return Err(BillsyncError::validation(
                "company payload missing name or cpfCnpj",
            ));
        }

        // 3. Register with the provider; rejections pass through.
        let response = gateway.create_customer(&customer).await?;
        self.config.trace_response("create customer", &response);
        let response = response.into_result()?;
        let customer_id = parse_customer_id(&response)
            .ok_or_else(|| BillsyncError::gateway("invalid asaas response (missing customer id)"))?;

        // 4. Persist the mapping. The provider customer already exists.
        self.persist_mapping(company_id, &customer_id, request_id)
            .await?;
        Ok(customer_id)
    }

    /// Register a company explicitly with caller-supplied data.
    ///
    /// Rejected with a conflict when the company is already mapped. A
    /// failure while checking for an existing mapping does not block
    /// creation.
    pub async fn create_for_company(
        &self,
        office_id: Uuid,
        company_id: Uuid,
        input: NewCustomer,
    ) -> BillsyncResult<ProviderResponse> {
        let input = input.normalized();
        if !input.has_required_fields() {
            return Err(BillsyncError::validation("name and cpfCnpj are required"));
        }

        match self.backend.mappings().find(company_id).await {
            Ok(Some(provider_customer_id)) => {
                return Err(SyncError::CustomerAlreadyMapped {
                    provider_customer_id,
                }
                .into());
            }
            Ok(None) => {}
            Err(e) => {
                warn!(%company_id, error = %e, "Error checking existing customer mapping, continuing");
            }
        }

        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.create_customer(&input).await?;
        self.config.trace_response("create customer", &response);
        if !response.is_success() {
            return Ok(response);
        }

        let customer_id = parse_customer_id(&response)
            .ok_or_else(|| BillsyncError::gateway("invalid asaas response (missing id)"))?;
        let request_id = token::new_request_id();
        self.persist_mapping(company_id, &customer_id, &request_id)
            .await?;
        Ok(response)
    }

    pub async fn get_by_id(
        &self,
        office_id: Uuid,
        customer_id: &str,
    ) -> BillsyncResult<ProviderResponse> {
        let customer_id = required_id(customer_id)?;
        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.get_customer(customer_id).await?;
        self.config.trace_response("get customer", &response);
        Ok(response)
    }

    pub async fn get_by_company(
        &self,
        office_id: Uuid,
        company_id: Uuid,
    ) -> BillsyncResult<ProviderResponse> {
        let customer_id = self.require_mapping(company_id).await?;
        self.get_by_id(office_id, &customer_id).await
    }

    /// Partially update a provider customer. Blank fields are dropped; an
    /// update with nothing left is rejected.
    pub async fn update_by_id(
        &self,
        office_id: Uuid,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        let customer_id = required_id(customer_id)?;
        let update = update.normalized();
        if update.is_empty() {
            return Err(BillsyncError::validation(
                "at least one field is required to update",
            ));
        }

        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.update_customer(customer_id, &update).await?;
        self.config.trace_response("update customer", &response);
        Ok(response)
    }

    pub async fn update_by_company(
        &self,
        office_id: Uuid,
        company_id: Uuid,
        update: CustomerUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        let update = update.normalized();
        if update.is_empty() {
            return Err(BillsyncError::validation(
                "at least one field is required to update",
            ));
        }
        let customer_id = self.require_mapping(company_id).await?;
        self.update_by_id(office_id, &customer_id, update).await
    }

    async fn require_mapping(&self, company_id: Uuid) -> BillsyncResult<String> {
        self.resolve(company_id)
            .await?
            .ok_or_else(|| SyncError::CustomerNotMapped { company_id }.into())
    }

    async fn persist_mapping(
        &self,
        company_id: Uuid,
        customer_id: &str,
        request_id: &str,
    ) -> BillsyncResult<()> {
        self.backend
            .mappings()
            .save(company_id, customer_id)
            .await
            .map_err(|e| {
                error!(
                    request_id,
                    %company_id,
                    provider_customer_id = customer_id,
                    error = %e,
                    "Failed to persist customer mapping"
                );
                BillsyncError::gateway("failed to persist asaas integration")
                    .with_details(e)
                    .with_request_id(request_id)
            })?;
        info!(%company_id, provider_customer_id = customer_id, "Customer mapping saved");
        Ok(())
    }
}

fn parse_customer_id(response: &ProviderResponse) -> Option<String> {
    response
        .json::<ProviderCustomer>()
        .ok()
        .and_then(|customer| customer.id)
}

