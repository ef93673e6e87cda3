//! Customer identity models.
//!
//! A company is known to the provider as a "customer". The link between the
//! two is the [`CustomerMapping`], created once and never updated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::serde_util::{blank_as_none, trimmed};

/// Link between an internal company and its provider customer id, scoped
/// by the company's current tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerMapping {
    pub company_id: Uuid,
    pub provider_customer_id: String,
}

/// Minimal company data needed to register it as a provider customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyBillingProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpf_cnpj: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub company: bool,
    #[serde(default)]
    pub notification_disabled: bool,
}

impl CompanyBillingProfile {
    pub fn into_new_customer(self) -> NewCustomer {
        NewCustomer {
            name: self.name.trim().to_string(),
            cpf_cnpj: self.cpf_cnpj.trim().to_string(),
            email: trimmed(self.email),
            mobile_phone: trimmed(self.mobile_phone),
            notification_disabled: self.notification_disabled,
            company: self.company,
        }
    }
}

/// Customer creation payload, accepted from callers and sent to the
/// provider as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpf_cnpj: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub notification_disabled: bool,
    #[serde(default)]
    pub company: bool,
}

impl NewCustomer {
    /// Trim every field; blank optionals become `None`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            cpf_cnpj: self.cpf_cnpj.trim().to_string(),
            email: trimmed(self.email),
            mobile_phone: trimmed(self.mobile_phone),
            ..self
        }
    }

    /// Name and tax id are required by the provider.
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty() && !self.cpf_cnpj.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersonType {
    Juridica,
    Fisica,
}

/// Partial customer update. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf_cnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_emails: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_type: Option<PersonType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_customer: Option<bool>,
}

impl CustomerUpdate {
    /// Trim string fields and drop blank ones.
    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            cpf_cnpj: trimmed(self.cpf_cnpj),
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            mobile_phone: trimmed(self.mobile_phone),
            address: trimmed(self.address),
            address_number: trimmed(self.address_number),
            complement: trimmed(self.complement),
            province: trimmed(self.province),
            state: trimmed(self.state),
            country: trimmed(self.country),
            postal_code: trimmed(self.postal_code),
            additional_emails: trimmed(self.additional_emails),
            external_reference: trimmed(self.external_reference),
            observations: trimmed(self.observations),
            ..self
        }
    }

    /// True when no field would be sent to the provider.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The part of a provider customer object billsync reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCustomer {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
}
