//! Provider webhook notifications.

use serde::{Deserialize, Serialize};

/// A notification pushed by the provider. Transient; never stored on its
/// own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    /// Event name such as `PAYMENT_RECEIVED` or `PAYMENT_UPDATED`.
    #[serde(default)]
    pub event: String,
    /// Provider-local timestamp, e.g. `2026-01-24 16:13:02`.
    #[serde(default)]
    pub date_created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<WebhookAccount>,
    /// Embedded charge object, kept raw so it can be stored as a snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

impl WebhookEvent {
    /// The embedded charge object, if any. A JSON `null` counts as absent.
    pub fn payment(&self) -> Option<&serde_json::Value> {
        self.payment.as_ref().filter(|p| !p.is_null())
    }
}

/// What the webhook reconciler did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed { payment_id: String, status: String },
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoPaymentObject,
    /// The payment object could not be decoded. Redelivery cannot fix it.
    InvalidPaymentObject,
    ChargeNotFound,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPaymentObject => "no_payment_object",
            Self::InvalidPaymentObject => "invalid_payment_object",
            Self::ChargeNotFound => "charge_not_found",
        }
    }
}
