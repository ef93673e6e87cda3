//! Charge domain model: the provider-agnostic row mirrored into the
//! tenant data store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::payment::ProviderPayment;
use crate::models::provider::ProviderCode;

/// Ownership context of a charge. Set once at creation and carried
/// unchanged through every later update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeContext {
    pub tenant_id: Uuid,
    pub office_id: Uuid,
    pub company_id: Uuid,
    pub contract_id: Uuid,
}

/// A charge row. `(tenant_id, provider, provider_charge_id)` is unique.
///
/// Every column is serialized, absent values as `null`, so an upsert
/// overwrites the whole row and bulk rows share one key set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub tenant_id: Uuid,
    #[serde(rename = "accounting_office_id")]
    pub office_id: Uuid,
    pub company_id: Uuid,
    pub contract_id: Uuid,

    pub provider: ProviderCode,
    pub provider_charge_id: String,
    #[serde(default)]
    pub provider_installment_id: Option<String>,
    #[serde(default)]
    pub installment_number: Option<i32>,

    pub value: Decimal,
    #[serde(default)]
    pub net_value: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub billing_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub original_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,

    /// Raw provider object as last seen.
    #[serde(default)]
    pub provider_payload: serde_json::Value,
}

impl Charge {
    /// Build a row from a raw provider charge object.
    ///
    /// Returns `Ok(None)` when the object carries no id; such records
    /// cannot be keyed and are skipped.
    pub fn from_payment(
        ctx: &ChargeContext,
        provider: &ProviderCode,
        raw: &serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        let payment = ProviderPayment::from_value(raw)?;
        let Some(id) = payment.id.clone() else {
            return Ok(None);
        };

        let mut charge = Self {
            tenant_id: ctx.tenant_id,
            office_id: ctx.office_id,
            company_id: ctx.company_id,
            contract_id: ctx.contract_id,
            provider: provider.clone(),
            provider_charge_id: id,
            provider_installment_id: None,
            installment_number: None,
            value: Decimal::ZERO,
            net_value: None,
            description: None,
            billing_type: None,
            status: None,
            due_date: None,
            original_due_date: None,
            invoice_url: None,
            invoice_number: None,
            external_reference: None,
            provider_payload: serde_json::Value::Null,
        };
        charge.overwrite(payment, raw.clone());
        Ok(Some(charge))
    }

    /// Overwrite the mutable fields from a newer provider object.
    ///
    /// Ownership context and the provider id never change. Installment
    /// context is kept when the payload omits it.
    pub fn apply_payment(&mut self, raw: &serde_json::Value) -> Result<(), serde_json::Error> {
        let payment = ProviderPayment::from_value(raw)?;
        self.overwrite(payment, raw.clone());
        Ok(())
    }

    pub fn context(&self) -> ChargeContext {
        ChargeContext {
            tenant_id: self.tenant_id,
            office_id: self.office_id,
            company_id: self.company_id,
            contract_id: self.contract_id,
        }
    }

    fn overwrite(&mut self, p: ProviderPayment, raw: serde_json::Value) {
        if p.installment.is_some() {
            self.provider_installment_id = p.installment;
        }
        if p.installment_number.is_some() {
            self.installment_number = p.installment_number;
        }
        if let Some(value) = p.value {
            self.value = value;
        }
        self.net_value = p.net_value.filter(|v| !v.is_zero());
        self.description = p.description;
        self.billing_type = p.billing_type;
        self.status = p.status;
        self.due_date = p.due_date;
        self.original_due_date = p.original_due_date;
        self.invoice_url = p.invoice_url;
        self.invoice_number = p.invoice_number;
        self.external_reference = p.external_reference;
        self.provider_payload = raw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ChargeContext {
        ChargeContext {
            tenant_id: Uuid::new_v4(),
            office_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            contract_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn from_payment_maps_fields() {
        let ctx = ctx();
        let raw = json!({
            "id": "pay_1",
            "installment": "ins_9",
            "installmentNumber": 2,
            "value": 50.0,
            "netValue": 49.01,
            "billingType": "BOLETO",
            "status": "PENDING",
            "dueDate": "2025-04-10",
            "externalReference": "contract-7"
        });

        let charge = Charge::from_payment(&ctx, &ProviderCode::asaas(), &raw)
            .unwrap()
            .unwrap();
        assert_eq!(charge.context(), ctx);
        assert_eq!(charge.provider_charge_id, "pay_1");
        assert_eq!(charge.provider_installment_id.as_deref(), Some("ins_9"));
        assert_eq!(charge.installment_number, Some(2));
        assert_eq!(charge.value, Decimal::new(5000, 2));
        assert_eq!(charge.due_date, NaiveDate::from_ymd_opt(2025, 4, 10));
        assert_eq!(charge.provider_payload, raw);
    }

    #[test]
    fn payment_without_id_is_skipped() {
        let raw = json!({"id": "", "value": 10.0});
        assert!(
            Charge::from_payment(&ctx(), &ProviderCode::asaas(), &raw)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn apply_payment_keeps_context_and_installment() {
        let ctx = ctx();
        let mut charge = Charge::from_payment(
            &ctx,
            &ProviderCode::asaas(),
            &json!({"id": "pay_1", "installment": "ins_9", "installmentNumber": 1, "value": 150.0, "status": "PENDING"}),
        )
        .unwrap()
        .unwrap();

        charge
            .apply_payment(&json!({"id": "pay_1", "value": 150.0, "status": "RECEIVED"}))
            .unwrap();

        assert_eq!(charge.context(), ctx);
        assert_eq!(charge.status.as_deref(), Some("RECEIVED"));
        assert_eq!(charge.provider_installment_id.as_deref(), Some("ins_9"));
        assert_eq!(charge.installment_number, Some(1));
    }

    #[test]
    fn row_uses_store_column_names() {
        let charge = Charge::from_payment(
            &ctx(),
            &ProviderCode::asaas(),
            &json!({"id": "pay_1", "value": 150.0}),
        )
        .unwrap()
        .unwrap();
        let row = serde_json::to_value(&charge).unwrap();
        assert!(row.get("accounting_office_id").is_some());
        assert_eq!(row["provider"], "ASAAS");
        assert!(row["net_value"].is_null());
    }

    #[test]
    fn cleared_fields_serialize_as_null() {
        let mut charge = Charge::from_payment(
            &ctx(),
            &ProviderCode::asaas(),
            &json!({"id": "pay_1", "value": 150.0, "description": "old", "invoiceUrl": "https://x/i/1"}),
        )
        .unwrap()
        .unwrap();

        charge
            .apply_payment(&json!({"id": "pay_1", "value": 150.0, "status": "RECEIVED"}))
            .unwrap();

        let row = serde_json::to_value(&charge).unwrap();
        assert_eq!(row["description"], serde_json::Value::Null);
        assert_eq!(row["invoice_url"], serde_json::Value::Null);
        assert!(row.as_object().unwrap().contains_key("description"));
    }

    #[test]
    fn rows_share_one_key_set() {
        let ctx = ctx();
        let sparse = Charge::from_payment(&ctx, &ProviderCode::asaas(), &json!({"id": "pay_1", "value": 50.0}))
            .unwrap()
            .unwrap();
        let full = Charge::from_payment(
            &ctx,
            &ProviderCode::asaas(),
            &json!({"id": "pay_2", "value": 50.0, "netValue": 49.01, "installment": "ins_1", "installmentNumber": 2}),
        )
        .unwrap()
        .unwrap();

        let keys = |c: &Charge| {
            let mut keys: Vec<String> = serde_json::to_value(c)
                .unwrap()
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect();
            keys.sort();
            keys
        };
        assert_eq!(keys(&sparse), keys(&full));
    }
}
