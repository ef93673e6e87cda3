//! Webhook ingest and reconciliation.

use billsync_core::error::{BillsyncError, BillsyncResult};
use billsync_core::models::payment::ProviderPayment;
use billsync_core::models::webhook::{SkipReason, WebhookEvent, WebhookOutcome};
use billsync_core::repository::{Backend, ChargeRepository};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::token;

/// Applies provider notifications to existing charge rows.
///
/// Events are applied in arrival order; a late delivery of an older event
/// overwrites a newer state. Events for charges this service did not
/// create are acknowledged and dropped.
#[derive(Clone)]
pub struct WebhookService<B: Backend> {
    backend: B,
    config: SyncConfig,
}

impl<B: Backend> WebhookService<B> {
    pub fn new(backend: B, config: SyncConfig) -> Self {
        if config.webhook_secret.is_none() {
            warn!("ASAAS_WEBHOOK_SECRET not set, webhook requests are not authenticated");
        }
        Self { backend, config }
    }

    /// Check the shared secret presented in the request header.
    pub fn authorize(&self, presented: Option<&str>) -> BillsyncResult<()> {
        let Some(expected) = self.config.webhook_secret.as_deref() else {
            warn!("Accepting unauthenticated webhook");
            return Ok(());
        };
        match presented {
            Some(presented) if token::secrets_match(presented, expected) => Ok(()),
            _ => {
                warn!("Rejected webhook with missing or invalid access token");
                Err(SyncError::WebhookUnauthorized.into())
            }
        }
    }

    /// Apply one event. Store failures are returned so the provider
    /// redelivers.
    pub async fn ingest(&self, event: WebhookEvent) -> BillsyncResult<WebhookOutcome> {
        let Some(raw) = event.payment() else {
            info!(event_id = %event.id, event = %event.event, "Webhook without payment object");
            return Ok(WebhookOutcome::Skipped {
                reason: SkipReason::NoPaymentObject,
            });
        };

        let payment = match ProviderPayment::from_value(raw) {
            Ok(payment) => payment,
            Err(e) => return Ok(invalid_payment(&event, &e)),
        };
        let Some(payment_id) = payment.id else {
            warn!(event_id = %event.id, "Webhook payment object without id");
            return Ok(WebhookOutcome::Skipped {
                reason: SkipReason::NoPaymentObject,
            });
        };

        let charges = self.backend.charges();
        let found = charges
            .find_by_provider_id(&self.config.provider, &payment_id)
            .await
            .map_err(|e| BillsyncError::gateway("failed to load charge").with_details(e))?;
        let Some(mut charge) = found else {
            info!(
                event_id = %event.id,
                event = %event.event,
                payment_id = %payment_id,
                "Webhook for unknown charge, ignoring"
            );
            return Ok(WebhookOutcome::Skipped {
                reason: SkipReason::ChargeNotFound,
            });
        };

        if let Err(e) = charge.apply_payment(raw) {
            return Ok(invalid_payment(&event, &e));
        }
        charges
            .upsert(std::slice::from_ref(&charge))
            .await
            .map_err(|e| BillsyncError::gateway("failed to update charge").with_details(e))?;

        let status = charge.status.clone().unwrap_or_default();
        info!(
            event_id = %event.id,
            event = %event.event,
            payment_id = %payment_id,
            status = %status,
            tenant_id = %charge.tenant_id,
            "Charge updated from webhook"
        );
        Ok(WebhookOutcome::Processed { payment_id, status })
    }
}

fn invalid_payment(event: &WebhookEvent, err: &serde_json::Error) -> WebhookOutcome {
    warn!(
        event_id = %event.id,
        event = %event.event,
        error = %err,
        "Webhook payment object could not be decoded, ignoring"
    );
    WebhookOutcome::Skipped {
        reason: SkipReason::InvalidPaymentObject,
    }
}
