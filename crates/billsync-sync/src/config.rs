//! Synchronization configuration.

use billsync_core::gateway::ProviderResponse;
use billsync_core::models::provider::ProviderCode;
use tracing::debug;

/// Configuration shared by the synchronization services.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Provider every credential and charge row is scoped to.
    pub provider: ProviderCode,
    /// Shared secret expected in the `asaas-access-token` webhook header.
    /// `None` accepts every webhook.
    pub webhook_secret: Option<String>,
    /// Log provider bodies and expose error details to callers.
    pub debug: bool,
    /// Page size of the post-create reconciliation listing (default: 100).
    pub reconcile_page_size: u32,
    /// Provider bodies are cut to this many characters in debug logs.
    pub log_body_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provider: ProviderCode::asaas(),
            webhook_secret: None,
            debug: false,
            reconcile_page_size: 100,
            log_body_limit: 800,
        }
    }
}

impl SyncConfig {
    /// Log a provider answer when debug mode is on.
    pub(crate) fn trace_response(&self, operation: &str, response: &ProviderResponse) {
        if self.debug {
            debug!(
                operation,
                status = response.status,
                body = %response.body_preview(self.log_body_limit),
                "Provider response"
            );
        }
    }
}
