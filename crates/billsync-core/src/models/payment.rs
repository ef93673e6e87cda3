//! Provider charge ("payment") wire models.
//!
//! The provider calls charges *payments*. Inbound caller payloads, outbound
//! provider requests and the typed view of provider responses are kept as
//! separate types so internal field mapping never leaks into the wire
//! contract.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::serde_util::{blank_as_none, optional_date};

/// How the charge is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Boleto,
    CreditCard,
    Pix,
    Undefined,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boleto => "BOLETO",
            Self::CreditCard => "CREDIT_CARD",
            Self::Pix => "PIX",
            Self::Undefined => "UNDEFINED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdjustmentKind {
    Fixed,
    Percentage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_limit_days: Option<i32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AdjustmentKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fine {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AdjustmentKind>,
}

/// Revenue split towards another provider wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub wallet_id: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_value: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub percentual_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Charge creation payload as received from callers.
///
/// Required fields are optional here so that their absence is reported as
/// a validation error instead of a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChargeRequest {
    #[serde(default)]
    pub billing_type: Option<BillingType>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    /// Boleto only.
    #[serde(default)]
    pub days_after_due_date_to_registration_cancellation: Option<i32>,
    #[serde(default)]
    pub external_reference: Option<String>,

    #[serde(default)]
    pub installment_count: Option<i32>,
    #[serde(default)]
    pub total_value: Option<Decimal>,
    #[serde(default)]
    pub installment_value: Option<Decimal>,

    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub interest: Option<Interest>,
    #[serde(default)]
    pub fine: Option<Fine>,
    #[serde(default)]
    pub postal_service: Option<bool>,
}

/// Charge creation request sent to the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCharge {
    pub customer: String,
    pub billing_type: BillingType,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_after_due_date_to_registration_cancellation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_count: Option<i32>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_value: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub installment_value: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest: Option<Interest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine: Option<Fine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_service: Option<bool>,
}

/// Partial charge update. Only charges awaiting payment or overdue can be
/// updated by the provider, and the customer can never change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_type: Option<BillingType>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_after_due_date_to_registration_cancellation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest: Option<Interest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine: Option<Fine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_service: Option<bool>,

    /// Free-form redirect settings; the provider's schema for it evolves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub split: Vec<Split>,
}

/// Typed view of a provider charge object. Only the fields mirrored into
/// the charges table are read; the raw JSON is kept alongside.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayment {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub customer: Option<String>,
    /// Installment series id, shared by every charge of a plan.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub installment: Option<String>,
    #[serde(default)]
    pub installment_number: Option<i32>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub net_value: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub billing_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub original_due_date: Option<NaiveDate>,
    #[serde(default, rename = "invoiceUrl", deserialize_with = "blank_as_none")]
    pub invoice_url: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub external_reference: Option<String>,
}

impl ProviderPayment {
    /// Parse a raw provider object, keeping it for the payload snapshot.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }
}

/// Paginated list envelope returned by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

/// Query string for the provider's charge list, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChargeQuery {
    params: Vec<(String, String)>,
}

impl ChargeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an earlier value for the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
