//! billsync Asaas: HTTP client for the Asaas payment provider.
//!
//! [`AsaasConnector`] owns the shared connection pool and hands out
//! [`AsaasClient`]s bound to one resolved credential.

mod client;
mod error;

pub use client::{AsaasClient, AsaasConnector, DEFAULT_TIMEOUT};
pub use error::AsaasError;
