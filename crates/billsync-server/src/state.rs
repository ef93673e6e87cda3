//! Shared handler state.

use billsync_core::error::BillsyncError;
use billsync_core::repository::Backend;
use billsync_sync::{ChargeService, CustomerService, SyncConfig, WebhookService};

use crate::error::ApiError;

/// Services shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState<B: Backend> {
    pub customers: CustomerService<B>,
    pub charges: ChargeService<B>,
    pub webhooks: WebhookService<B>,
    debug: bool,
}

impl<B: Backend> AppState<B> {
    pub fn new(backend: B, config: SyncConfig) -> Self {
        Self {
            customers: CustomerService::new(backend.clone(), config.clone()),
            charges: ChargeService::new(backend.clone(), config.clone()),
            debug: config.debug,
            webhooks: WebhookService::new(backend, config),
        }
    }

    /// Map a service error, exposing details only in debug mode.
    pub fn reject(&self, err: BillsyncError) -> ApiError {
        ApiError::from_service(err, self.debug)
    }
}
