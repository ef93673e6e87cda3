//! billsync tenant data store: PostgREST client and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`StoreClient`], [`StoreConfig`])
//! - Error types ([`StoreError`])
//! - Implementations of the `billsync-core` repository traits
//!   ([`repository`])

mod connection;
mod error;
pub mod repository;

pub use connection::{Schema, StoreClient, StoreConfig};
pub use error::StoreError;
