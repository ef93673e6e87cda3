//! PostgREST repository implementations.

mod charge;
mod company;
mod credential;
mod customer_mapping;

pub use charge::RestChargeRepository;
pub use company::RestCompanyDirectory;
pub use credential::RestCredentialRepository;
pub use customer_mapping::RestCustomerMappingRepository;

/// PostgREST equality filter value.
pub(crate) fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}
