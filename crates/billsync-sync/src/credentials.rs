//! Credential resolution.
//!
//! Picks the single provider credential to use for an office and binds a
//! gateway to it.

use billsync_core::error::BillsyncResult;
use billsync_core::gateway::GatewayFactory;
use billsync_core::models::credential::{ResolvedCredential, TenantCredential};
use billsync_core::models::provider::ProviderCode;
use billsync_core::repository::{Backend, CredentialRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::SyncError;

/// Gateway type produced by a backend's connector.
pub type GatewayOf<B> = <<B as Backend>::Connector as GatewayFactory>::Gateway;

/// Choose one credential among candidates.
///
/// Inactive rows are ignored. The default flag wins, then the most
/// recently updated, then the most recently created; missing timestamps
/// sort last.
pub fn select_credential(mut candidates: Vec<TenantCredential>) -> Option<TenantCredential> {
    candidates.retain(|c| c.is_active);
    candidates.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    candidates.into_iter().next()
}

/// Resolve the credential for `(office_id, provider)`.
///
/// A credential without a base URL or token is a configuration error, not
/// a missing credential.
pub async fn resolve_credential<R: CredentialRepository>(
    repo: &R,
    office_id: Uuid,
    provider: &ProviderCode,
) -> BillsyncResult<ResolvedCredential> {
    let provider = ProviderCode::normalize(provider.as_str());
    let candidates = repo.list_active(office_id, &provider).await?;
    let chosen = select_credential(candidates).ok_or_else(|| SyncError::CredentialNotFound {
        office_id,
        provider: provider.clone(),
    })?;

    let base_url = chosen.base_url.as_deref().map(str::trim).unwrap_or_default();
    let token = chosen.token.as_deref().map(str::trim).unwrap_or_default();
    if base_url.is_empty() || token.is_empty() {
        return Err(SyncError::CredentialMisconfigured.into());
    }

    let resolved = ResolvedCredential {
        id: chosen.id,
        office_id: chosen.office_id,
        provider: chosen.provider,
        environment: chosen.environment,
        base_url: base_url.to_string(),
        token: token.to_string(),
        is_default: chosen.is_default,
    };
    debug!(
        credential_id = %resolved.id,
        %office_id,
        provider = %resolved.provider,
        environment = resolved.environment.as_deref().unwrap_or(""),
        is_default = resolved.is_default,
        base_url = %resolved.base_url,
        token = %resolved.masked_token(),
        "Using billing integration"
    );
    Ok(resolved)
}

/// Resolve the office credential and bind a gateway to it.
pub async fn connect_gateway<B: Backend>(
    backend: &B,
    office_id: Uuid,
    provider: &ProviderCode,
) -> BillsyncResult<GatewayOf<B>> {
    let credential = resolve_credential(backend.credentials(), office_id, provider).await?;
    backend.connector().connect(&credential)
}
