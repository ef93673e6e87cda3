//! billsync Sync: the workflows that keep the provider, the customer
//! mapping and the charges table consistent.
//!
//! Every service is generic over a [`Backend`](billsync_core::Backend) so
//! this crate has no dependency on the data store or provider client
//! crates.

pub mod charges;
pub mod config;
pub mod credentials;
pub mod customers;
pub mod error;
pub mod token;
pub mod webhook;

pub use charges::{ChargeCreated, ChargeDeleted, ChargeService, NewChargeInput};
pub use config::SyncConfig;
pub use customers::CustomerService;
pub use error::SyncError;
pub use webhook::WebhookService;

use billsync_core::error::{BillsyncError, BillsyncResult};

/// Trimmed provider id from a path segment; blank ids are rejected.
pub(crate) fn required_id(id: &str) -> BillsyncResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(BillsyncError::validation("id is required"));
    }
    Ok(id)
}
