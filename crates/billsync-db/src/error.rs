//! Data-store-specific error types and conversions.

use billsync_core::error::BillsyncError;

/// Data-store-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} failed: HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response for {operation}: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Data store not configured: {0}")]
    Config(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<StoreError> for BillsyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => BillsyncError::NotFound { entity, id },
            other => BillsyncError::gateway(other.to_string()),
        }
    }
}
