//! Provider credential domain model.
//!
//! Credentials are configured per accounting office and provider. Several
//! may be active at once (e.g. sandbox and production); exactly one is
//! chosen per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::provider::ProviderCode;

/// A stored provider integration for an office. Read-only for billsync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCredential {
    pub id: Uuid,
    pub office_id: Uuid,
    pub provider: ProviderCode,
    /// Free-form environment label (`SANDBOX`, `PRODUCTION`, ...).
    pub environment: Option<String>,
    pub base_url: Option<String>,
    /// Secret API token. Never log it unmasked.
    pub token: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A credential that passed configuration checks and can be used to talk
/// to the provider.
#[derive(Clone)]
pub struct ResolvedCredential {
    pub id: Uuid,
    pub office_id: Uuid,
    pub provider: ProviderCode,
    pub environment: Option<String>,
    pub base_url: String,
    pub token: String,
    pub is_default: bool,
}

impl ResolvedCredential {
    /// Token rendered for logs: length plus the last four characters.
    pub fn masked_token(&self) -> String {
        mask_token(&self.token)
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("id", &self.id)
            .field("office_id", &self.office_id)
            .field("provider", &self.provider)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("token", &self.masked_token())
            .field("is_default", &self.is_default)
            .finish()
    }
}

pub fn mask_token(token: &str) -> String {
    let token = token.trim();
    if token.is_empty() {
        return "(empty)".into();
    }
    let chars: Vec<char> = token.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("len={} ****{tail}", chars.len())
}
