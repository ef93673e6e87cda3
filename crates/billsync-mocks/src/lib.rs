//! Test doubles for billsync.
//!
//! [`MemoryStore`] implements every data store repository in memory and
//! [`MockProvider`] behaves like a small Asaas account. [`MemoryBackend`]
//! bundles both so services and the HTTP router can run without network
//! access.

mod provider;
mod store;

pub use provider::{MockConnector, MockGateway, MockProvider, Op};
pub use store::{FailurePoint, MemoryStore};

use billsync_core::repository::Backend;

/// In-memory [`Backend`] for tests.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    pub store: MemoryStore,
    pub connector: MockConnector,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(&self) -> &MockProvider {
        self.connector.provider()
    }
}

impl Backend for MemoryBackend {
    type Credentials = MemoryStore;
    type Mappings = MemoryStore;
    type Companies = MemoryStore;
    type Charges = MemoryStore;
    type Connector = MockConnector;

    fn credentials(&self) -> &MemoryStore {
        &self.store
    }

    fn mappings(&self) -> &MemoryStore {
        &self.store
    }

    fn companies(&self) -> &MemoryStore {
        &self.store
    }

    fn charges(&self) -> &MemoryStore {
        &self.store
    }

    fn connector(&self) -> &MockConnector {
        &self.connector
    }
}
