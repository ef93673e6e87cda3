//! Provider-client error types and conversions.

use billsync_core::error::BillsyncError;

#[derive(Debug, thiserror::Error)]
pub enum AsaasError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<AsaasError> for BillsyncError {
    fn from(err: AsaasError) -> Self {
        match err {
            AsaasError::Config(message) => BillsyncError::validation(message),
            other => BillsyncError::gateway("provider request failed").with_details(other),
        }
    }
}
