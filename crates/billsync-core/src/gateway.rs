//! Payment provider gateway abstraction.
//!
//! A gateway is bound to one resolved credential and speaks the provider's
//! REST protocol. It is pure request/response: no retries, no state.
//! Non-2xx answers are returned as data so callers can forward them
//! verbatim; only transport failures surface as errors.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{BillsyncError, BillsyncResult};
use crate::models::credential::ResolvedCredential;
use crate::models::customer::{CustomerUpdate, NewCustomer};
use crate::models::payment::{ChargeQuery, ChargeUpdate, NewCharge};

/// Raw provider answer: status code plus the untouched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ProviderResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Turn a non-2xx answer into [`BillsyncError::ProviderRejected`].
    pub fn into_result(self) -> BillsyncResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(BillsyncError::ProviderRejected(self))
        }
    }

    /// Body as text, cut to `max` characters for logging.
    pub fn body_preview(&self, max: usize) -> String {
        let text = String::from_utf8_lossy(&self.body);
        match text.char_indices().nth(max) {
            Some((cut, _)) => format!("{}...(truncated)", &text[..cut]),
            None => text.into_owned(),
        }
    }
}

pub trait PaymentGateway: Send + Sync {
    fn create_customer(
        &self,
        input: &NewCustomer,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn get_customer(
        &self,
        customer_id: &str,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn update_customer(
        &self,
        customer_id: &str,
        input: &CustomerUpdate,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;

    fn create_charge(
        &self,
        input: &NewCharge,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn get_charge(
        &self,
        charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn update_charge(
        &self,
        charge_id: &str,
        input: &ChargeUpdate,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn delete_charge(
        &self,
        charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn list_charges(
        &self,
        query: &ChargeQuery,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;

    /// Boleto digitable line and barcode.
    fn identification_field(
        &self,
        charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
    fn pix_qr_code(
        &self,
        charge_id: &str,
    ) -> impl Future<Output = BillsyncResult<ProviderResponse>> + Send;
}

/// Builds gateways bound to a resolved credential.
pub trait GatewayFactory: Send + Sync {
    type Gateway: PaymentGateway;

    fn connect(&self, credential: &ResolvedCredential) -> BillsyncResult<Self::Gateway>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_becomes_rejection() {
        let resp = ProviderResponse::new(400, r#"{"errors":[]}"#);
        match resp.into_result() {
            Err(BillsyncError::ProviderRejected(r)) => assert_eq!(r.status, 400),
            other => panic!("unexpected {other:?}"),
        }
        assert!(ProviderResponse::new(204, "").into_result().is_ok());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let resp = ProviderResponse::new(200, "a".repeat(900));
        let preview = resp.body_preview(800);
        assert!(preview.starts_with(&"a".repeat(800)));
        assert!(preview.ends_with("...(truncated)"));
        assert_eq!(ProviderResponse::new(200, "short").body_preview(800), "short");
    }
}
