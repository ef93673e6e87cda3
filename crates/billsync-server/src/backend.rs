//! Production backend: PostgREST repositories plus the Asaas client.

use std::time::Duration;

use billsync_asaas::{AsaasConnector, AsaasError};
use billsync_core::repository::Backend;
use billsync_db::StoreClient;
use billsync_db::repository::{
    RestChargeRepository, RestCompanyDirectory, RestCredentialRepository,
    RestCustomerMappingRepository,
};

#[derive(Clone)]
pub struct AppBackend {
    credentials: RestCredentialRepository,
    mappings: RestCustomerMappingRepository,
    companies: RestCompanyDirectory,
    charges: RestChargeRepository,
    connector: AsaasConnector,
}

impl AppBackend {
    /// Every repository shares the store's connection pool.
    pub fn new(store: StoreClient, outbound_timeout: Duration) -> Result<Self, AsaasError> {
        Ok(Self {
            credentials: RestCredentialRepository::new(store.clone()),
            mappings: RestCustomerMappingRepository::new(store.clone()),
            companies: RestCompanyDirectory::new(store.clone()),
            charges: RestChargeRepository::new(store),
            connector: AsaasConnector::new(outbound_timeout)?,
        })
    }
}

impl Backend for AppBackend {
    type Credentials = RestCredentialRepository;
    type Mappings = RestCustomerMappingRepository;
    type Companies = RestCompanyDirectory;
    type Charges = RestChargeRepository;
    type Connector = AsaasConnector;

    fn credentials(&self) -> &RestCredentialRepository {
        &self.credentials
    }

    fn mappings(&self) -> &RestCustomerMappingRepository {
        &self.mappings
    }

    fn companies(&self) -> &RestCompanyDirectory {
        &self.companies
    }

    fn charges(&self) -> &RestChargeRepository {
        &self.charges
    }

    fn connector(&self) -> &AsaasConnector {
        &self.connector
    }
}
