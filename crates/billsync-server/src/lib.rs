//! billsync Server: HTTP surface of the charge synchronization service.
//!
//! Handlers are generic over a [`Backend`](billsync_core::Backend); the
//! binary wires the production [`AppBackend`], tests use in-memory doubles.

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use backend::AppBackend;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::{cors_layer, router};
pub use state::AppState;
