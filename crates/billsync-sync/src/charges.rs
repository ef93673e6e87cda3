//! Charge orchestration: creation with fan-out reconciliation, listing,
//! update and delete synchronization.

use std::collections::HashMap;

use billsync_core::error::{BillsyncError, BillsyncResult};
use billsync_core::gateway::{PaymentGateway, ProviderResponse};
use billsync_core::models::charge::{Charge, ChargeContext};
use billsync_core::models::payment::{
    BillingType, ChargeQuery, ChargeUpdate, NewCharge, NewChargeRequest, PaymentPage,
    ProviderPayment,
};
use billsync_core::repository::{Backend, ChargeRepository, CompanyDirectory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::credentials::connect_gateway;
use crate::customers::CustomerService;
use crate::error::SyncError;
use crate::{required_id, token};

/// Filters forwarded to the provider's charge list unchanged.
const PASS_THROUGH_FILTERS: &[&str] = &[
    "customerGroupName",
    "billingType",
    "status",
    "subscription",
    "installment",
    "externalReference",
    "paymentDate",
    "invoiceStatus",
    "estimatedCreditDate",
    "pixQrCodeId",
    "dateCreated[ge]",
    "dateCreated[le]",
    "paymentDate[ge]",
    "paymentDate[le]",
    "estimatedCreditDate[ge]",
    "estimatedCreditDate[le]",
    "dueDate[ge]",
    "dueDate[le]",
    "user",
    "checkoutSession",
];

const BOOLEAN_FILTERS: &[&str] = &["anticipated", "anticipable"];

const MAX_LIST_LIMIT: u32 = 100;

/// A charge creation request with its ownership context.
#[derive(Debug, Clone)]
pub struct NewChargeInput {
    pub office_id: Uuid,
    pub company_id: Uuid,
    pub contract_id: Uuid,
    pub request: NewChargeRequest,
}

/// Result of a successful creation: the provider's answer, forwarded
/// verbatim, and the rows written to the charges table.
#[derive(Debug, Clone)]
pub struct ChargeCreated {
    pub response: ProviderResponse,
    pub charges: Vec<Charge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeDeleted {
    pub id: String,
}

/// Charge lifecycle service.
#[derive(Clone)]
pub struct ChargeService<B: Backend> {
    backend: B,
    config: SyncConfig,
    customers: CustomerService<B>,
}

impl<B: Backend> ChargeService<B> {
    pub fn new(backend: B, config: SyncConfig) -> Self {
        let customers = CustomerService::new(backend.clone(), config.clone());
        Self {
            backend,
            config,
            customers,
        }
    }

    /// Create a charge and mirror every record it produced.
    ///
    /// A provider rejection is returned as [`BillsyncError::ProviderRejected`]
    /// and nothing is persisted. Once the provider accepted the charge,
    /// later failures are gateway errors and nothing is rolled back.
    pub async fn create(&self, input: NewChargeInput) -> BillsyncResult<ChargeCreated> {
        // 1. Local validation before any remote call.
        let validated = validate_request(&input.request)?;
        let request_id = token::new_request_id();

        // 2. Credential and customer.
        let gateway =
            connect_gateway(&self.backend, input.office_id, &self.config.provider).await?;
        let customer_id = self
            .customers
            .get_or_create(&gateway, input.company_id, &request_id)
            .await?;

        // 3. Submit.
        let external_reference = input.request.external_reference.clone();
        let charge = validated.into_new_charge(customer_id.clone(), input.request);
        let response = gateway.create_charge(&charge).await?;
        self.config.trace_response("create charge", &response);
        let response = response.into_result()?;
        let created: serde_json::Value = response.json().unwrap_or_default();

        // 4. Reconcile everything the request produced.
        let records = self
            .reconcile_created(&gateway, &customer_id, &created, external_reference)
            .await?;

        // 5. Ownership context.
        let tenant_id = self
            .backend
            .companies()
            .tenant_of(input.company_id)
            .await
            .map_err(|e| {
                error!(request_id = %request_id, company_id = %input.company_id, error = %e, "Failed to resolve tenant for company");
                BillsyncError::gateway("failed to resolve tenant for company")
                    .with_details(e)
                    .with_request_id(request_id.as_str())
            })?;
        let ctx = ChargeContext {
            tenant_id,
            office_id: input.office_id,
            company_id: input.company_id,
            contract_id: input.contract_id,
        };

        let mut charges = Vec::with_capacity(records.len());
        for raw in &records {
            match Charge::from_payment(&ctx, &self.config.provider, raw) {
                Ok(Some(charge)) => charges.push(charge),
                Ok(None) => debug!(request_id = %request_id, "Skipping provider record without id"),
                Err(e) => warn!(request_id = %request_id, error = %e, "Skipping unparsable provider record"),
            }
        }

        // 6. Persist.
        self.backend.charges().upsert(&charges).await.map_err(|e| {
            error!(request_id = %request_id, count = charges.len(), error = %e, "Failed to persist charges");
            BillsyncError::gateway("failed to persist charges")
                .with_details(e)
                .with_request_id(request_id.as_str())
        })?;

        info!(
            request_id = %request_id,
            tenant_id = %ctx.tenant_id,
            company_id = %ctx.company_id,
            contract_id = %ctx.contract_id,
            provider_customer_id = %customer_id,
            persisted = charges.len(),
            "Charge created"
        );
        Ok(ChargeCreated { response, charges })
    }

    /// List provider records sharing the new charge's installment (or
    /// external reference). Falls back to the created record alone.
    async fn reconcile_created<G: PaymentGateway>(
        &self,
        gateway: &G,
        customer_id: &str,
        created: &serde_json::Value,
        external_reference: Option<String>,
    ) -> BillsyncResult<Vec<serde_json::Value>> {
        let installment = ProviderPayment::from_value(created)
            .ok()
            .and_then(|p| p.installment);

        let mut query = ChargeQuery::new();
        query
            .set("customer", customer_id)
            .set("limit", self.config.reconcile_page_size.to_string())
            .set("offset", "0");
        match (&installment, external_reference.as_deref().map(str::trim)) {
            (Some(installment), _) => {
                query.set("installment", installment.as_str());
            }
            (None, Some(reference)) if !reference.is_empty() => {
                query.set("externalReference", reference);
            }
            _ => {}
        }

        let response = gateway.list_charges(&query).await.map_err(|e| {
            BillsyncError::gateway("failed to list charges after create").with_details(e)
        })?;
        self.config.trace_response("list charges", &response);

        let listed = if response.is_success() {
            response
                .json::<PaymentPage>()
                .map(|page| page.data)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Unparsable charge list, using created record");
                    Vec::new()
                })
        } else {
            warn!(status = response.status, "Charge list rejected, using created record");
            Vec::new()
        };

        debug!(
            installment = installment.as_deref().unwrap_or(""),
            listed = listed.len(),
            "Reconciliation listing"
        );
        if listed.is_empty() {
            return Ok(vec![created.clone()]);
        }
        Ok(listed)
    }

    /// List provider charges for an office, optionally scoped to a company.
    ///
    /// An explicit `customer` filter wins over `company_id`.
    pub async fn list(
        &self,
        office_id: Uuid,
        company_id: Option<Uuid>,
        filters: &HashMap<String, String>,
    ) -> BillsyncResult<ProviderResponse> {
        let mut query = build_list_query(filters)?;

        if query.get("customer").is_none() {
            if let Some(company_id) = company_id {
                let customer_id = self
                    .customers
                    .resolve(company_id)
                    .await?
                    .ok_or(SyncError::CustomerNotMapped { company_id })?;
                query.set("customer", customer_id);
            }
        }

        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.list_charges(&query).await?;
        self.config.trace_response("list charges", &response);
        Ok(response)
    }

    /// Update a charge at the provider and refresh the local row.
    ///
    /// The local refresh never fails the request.
    pub async fn update(
        &self,
        office_id: Uuid,
        charge_id: &str,
        update: ChargeUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        let charge_id = required_id(charge_id)?;
        let request_id = token::new_request_id();

        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.update_charge(charge_id, &update).await?;
        self.config.trace_response("update charge", &response);

        if response.is_success() {
            self.refresh_local(charge_id, &response, &request_id).await;
        }
        Ok(response)
    }

    async fn refresh_local(&self, charge_id: &str, response: &ProviderResponse, request_id: &str) {
        let raw: serde_json::Value = match response.json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(request_id, charge_id, error = %e, "Unparsable update response, local row not refreshed");
                return;
            }
        };
        let provider_charge_id = ProviderPayment::from_value(&raw)
            .ok()
            .and_then(|p| p.id)
            .unwrap_or_else(|| charge_id.to_string());

        let charges = self.backend.charges();
        let mut row = match charges
            .find_by_provider_id(&self.config.provider, &provider_charge_id)
            .await
        {
            Ok(Some(row)) => row,
            Ok(None) => {
                warn!(request_id, charge_id = %provider_charge_id, "Updated charge has no local row");
                return;
            }
            Err(e) => {
                warn!(request_id, charge_id = %provider_charge_id, error = %e, "Failed to look up local charge");
                return;
            }
        };

        if let Err(e) = row.apply_payment(&raw) {
            warn!(request_id, charge_id = %provider_charge_id, error = %e, "Unparsable provider charge");
            return;
        }
        match charges.upsert(std::slice::from_ref(&row)).await {
            Ok(()) => info!(request_id, charge_id = %provider_charge_id, "Local charge refreshed"),
            Err(e) => {
                warn!(request_id, charge_id = %provider_charge_id, error = %e, "Failed to refresh local charge")
            }
        }
    }

    /// Delete a charge at the provider, then locally.
    ///
    /// A local delete failure is logged and the call still succeeds.
    pub async fn delete(&self, office_id: Uuid, charge_id: &str) -> BillsyncResult<ChargeDeleted> {
        let charge_id = required_id(charge_id)?;

        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.delete_charge(charge_id).await?;
        self.config.trace_response("delete charge", &response);
        response.into_result()?;

        if let Err(e) = self
            .backend
            .charges()
            .delete_by_provider_id(&self.config.provider, charge_id)
            .await
        {
            warn!(charge_id, error = %e, "Failed to delete local charge");
        }

        info!(charge_id, "Charge deleted");
        Ok(ChargeDeleted {
            id: charge_id.to_string(),
        })
    }

    /// Read one charge straight from the provider.
    pub async fn get(&self, office_id: Uuid, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        let charge_id = required_id(charge_id)?;
        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.get_charge(charge_id).await?;
        self.config.trace_response("get charge", &response);
        Ok(response)
    }

    /// Boleto digitable line and barcode.
    pub async fn digitable_line(
        &self,
        office_id: Uuid,
        charge_id: &str,
    ) -> BillsyncResult<ProviderResponse> {
        let charge_id = required_id(charge_id)?;
        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.identification_field(charge_id).await?;
        self.config.trace_response("identification field", &response);
        Ok(response)
    }

    pub async fn pix_qr_code(
        &self,
        office_id: Uuid,
        charge_id: &str,
    ) -> BillsyncResult<ProviderResponse> {
        let charge_id = required_id(charge_id)?;
        let gateway = connect_gateway(&self.backend, office_id, &self.config.provider).await?;
        let response = gateway.pix_qr_code(charge_id).await?;
        self.config.trace_response("pix qr code", &response);
        Ok(response)
    }
}

struct ValidatedCharge {
    billing_type: BillingType,
    value: Decimal,
    due_date: NaiveDate,
}

impl ValidatedCharge {
    fn into_new_charge(self, customer: String, req: NewChargeRequest) -> NewCharge {
        NewCharge {
            customer,
            billing_type: self.billing_type,
            value: self.value,
            due_date: self.due_date,
            description: req.description.filter(|d| !d.trim().is_empty()),
            days_after_due_date_to_registration_cancellation: req
                .days_after_due_date_to_registration_cancellation,
            external_reference: req.external_reference.filter(|r| !r.trim().is_empty()),
            installment_count: req.installment_count,
            total_value: req.total_value,
            installment_value: req.installment_value,
            discount: req.discount,
            interest: req.interest,
            fine: req.fine,
            postal_service: req.postal_service,
        }
    }
}

fn validate_request(req: &NewChargeRequest) -> BillsyncResult<ValidatedCharge> {
    let billing_type = req
        .billing_type
        .ok_or_else(|| BillsyncError::validation("billingType is required"))?;
    let value = req
        .value
        .filter(|v| v.is_sign_positive() && !v.is_zero())
        .ok_or_else(|| BillsyncError::validation("value must be > 0"))?;
    let due_date = req
        .due_date
        .ok_or_else(|| BillsyncError::validation("dueDate is required"))?;
    Ok(ValidatedCharge {
        billing_type,
        value,
        due_date,
    })
}

/// Validate list filters and build the provider query. Blank values are
/// ignored; unknown keys are dropped.
fn build_list_query(filters: &HashMap<String, String>) -> BillsyncResult<ChargeQuery> {
    let value = |key: &str| {
        filters
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let mut query = ChargeQuery::new();
    if let Some(customer) = value("customer") {
        query.set("customer", customer);
    }
    for key in PASS_THROUGH_FILTERS {
        if let Some(v) = value(key) {
            query.set(*key, v);
        }
    }
    for key in BOOLEAN_FILTERS {
        if let Some(v) = value(key) {
            match v {
                "true" | "false" => {
                    query.set(*key, v);
                }
                _ => {
                    return Err(BillsyncError::validation(format!(
                        "{key} must be true or false"
                    )));
                }
            }
        }
    }
    if let Some(offset) = value("offset") {
        let offset: u64 = offset
            .parse()
            .map_err(|_| BillsyncError::validation("offset must be an integer"))?;
        query.set("offset", offset.to_string());
    }
    if let Some(limit) = value("limit") {
        let limit = limit
            .parse::<u32>()
            .ok()
            .filter(|l| *l <= MAX_LIST_LIMIT)
            .ok_or_else(|| {
                BillsyncError::validation("limit must be an integer between 0 and 100")
            })?;
        query.set("limit", limit.to_string());
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn request_validation_messages() {
        let mut req = NewChargeRequest::default();
        let msg = |req: &NewChargeRequest| match validate_request(req) {
            Err(BillsyncError::Validation { message }) => message,
            other => panic!("expected validation error, got {:?}", other.is_ok()),
        };
        assert_eq!(msg(&req), "billingType is required");

        req.billing_type = Some(BillingType::Pix);
        req.value = Some(Decimal::ZERO);
        assert_eq!(msg(&req), "value must be > 0");

        req.value = Some(Decimal::new(-100, 2));
        assert_eq!(msg(&req), "value must be > 0");

        req.value = Some(Decimal::new(15000, 2));
        assert_eq!(msg(&req), "dueDate is required");

        req.due_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn list_query_keeps_known_filters_in_fixed_order() {
        let query = build_list_query(&filters(&[
            ("status", "PENDING"),
            ("dueDate[ge]", "2025-01-01"),
            ("anticipated", "false"),
            ("limit", "50"),
            ("offset", "10"),
            ("unknown", "x"),
            ("billingType", "  "),
        ]))
        .unwrap();

        let keys: Vec<&str> = query.params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["status", "dueDate[ge]", "anticipated", "offset", "limit"]);
        assert_eq!(query.get("limit"), Some("50"));
    }

    #[test]
    fn list_query_rejects_bad_values() {
        let err = |pairs: &[(&str, &str)]| match build_list_query(&filters(pairs)) {
            Err(BillsyncError::Validation { message }) => message,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(err(&[("offset", "abc")]), "offset must be an integer");
        assert_eq!(
            err(&[("limit", "101")]),
            "limit must be an integer between 0 and 100"
        );
        assert_eq!(
            err(&[("limit", "-1")]),
            "limit must be an integer between 0 and 100"
        );
        assert_eq!(err(&[("anticipable", "yes")]), "anticipable must be true or false");
    }
}
