//! billsync core: domain models, error types and the collaborator traits
//! (tenant data store repositories and payment provider gateway) that the
//! synchronization services are generic over.

pub mod error;
pub mod gateway;
pub mod models;
pub mod repository;
pub mod serde_util;

pub use error::{BillsyncError, BillsyncResult};
pub use gateway::{GatewayFactory, PaymentGateway, ProviderResponse};
pub use repository::Backend;
