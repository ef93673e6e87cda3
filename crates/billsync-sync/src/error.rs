//! Synchronization error types.

use billsync_core::error::BillsyncError;
use billsync_core::models::provider::ProviderCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("billing integration not found for office/provider")]
    CredentialNotFound {
        office_id: Uuid,
        provider: ProviderCode,
    },

    #[error("integration config missing base_api or token")]
    CredentialMisconfigured,

    #[error("asaas integration already exists for this company (current tenant)")]
    CustomerAlreadyMapped { provider_customer_id: String },

    #[error("asaas integration not found for this company (current tenant)")]
    CustomerNotMapped { company_id: Uuid },

    #[error("company not found to create asaas customer")]
    CompanyNotFound { company_id: Uuid },

    #[error("invalid webhook access token")]
    WebhookUnauthorized,
}

impl From<SyncError> for BillsyncError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::CredentialNotFound {
                office_id,
                provider,
            } => BillsyncError::NotFound {
                entity: "billing integration".into(),
                id: format!("{office_id}/{provider}"),
            },
            SyncError::CredentialMisconfigured => BillsyncError::validation(err.to_string()),
            SyncError::CustomerAlreadyMapped {
                provider_customer_id,
            } => BillsyncError::AlreadyExists {
                entity: "customer mapping".into(),
                id: provider_customer_id,
            },
            SyncError::CustomerNotMapped { company_id } => {
                BillsyncError::not_found("customer mapping", company_id)
            }
            SyncError::CompanyNotFound { company_id } => {
                BillsyncError::not_found("company", company_id)
            }
            SyncError::WebhookUnauthorized => BillsyncError::Unauthorized {
                reason: err.to_string(),
            },
        }
    }
}
