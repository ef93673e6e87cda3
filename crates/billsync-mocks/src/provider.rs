//! Scripted Asaas provider.
//!
//! Keeps customers and charges in memory and answers like the real API.
//! Individual operations can be scripted to return a given response or to
//! fail at the transport level, once.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use billsync_core::error::{BillsyncError, BillsyncResult};
use billsync_core::gateway::{GatewayFactory, PaymentGateway, ProviderResponse};
use billsync_core::models::credential::ResolvedCredential;
use billsync_core::models::customer::{CustomerUpdate, NewCustomer};
use billsync_core::models::payment::{ChargeQuery, ChargeUpdate, NewCharge};
use chrono::Months;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Provider operations, used to script responses and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateCustomer,
    GetCustomer,
    UpdateCustomer,
    CreateCharge,
    GetCharge,
    UpdateCharge,
    DeleteCharge,
    ListCharges,
    IdentificationField,
    PixQrCode,
}

enum Scripted {
    Respond(ProviderResponse),
    TransportError,
}

#[derive(Default)]
struct State {
    customers: HashMap<String, Value>,
    payments: Vec<Value>,
    scripted: HashMap<Op, VecDeque<Scripted>>,
    calls: HashMap<Op, usize>,
    connected: Vec<Uuid>,
    list_queries: Vec<ChargeQuery>,
    sequence: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}_{:012}", self.sequence)
    }
}

/// In-memory provider account shared by clones.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Arc<RwLock<State>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next `op` call with `response` instead of the default
    /// behavior.
    pub async fn respond_once(&self, op: Op, response: ProviderResponse) {
        self.state
            .write()
            .await
            .scripted
            .entry(op)
            .or_default()
            .push_back(Scripted::Respond(response));
    }

    /// Fail the next `op` call as if the connection dropped.
    pub async fn fail_once(&self, op: Op) {
        self.state
            .write()
            .await
            .scripted
            .entry(op)
            .or_default()
            .push_back(Scripted::TransportError);
    }

    pub async fn calls(&self, op: Op) -> usize {
        self.state.read().await.calls.get(&op).copied().unwrap_or(0)
    }

    /// Credential ids gateways were created for, in order.
    pub async fn connected_credentials(&self) -> Vec<Uuid> {
        self.state.read().await.connected.clone()
    }

    pub async fn list_queries(&self) -> Vec<ChargeQuery> {
        self.state.read().await.list_queries.clone()
    }

    pub async fn payment(&self, id: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .payments
            .iter()
            .find(|p| p["id"] == id)
            .cloned()
    }

    /// Store a charge as if it had been created out of band.
    pub async fn insert_payment(&self, payment: Value) {
        self.state.write().await.payments.push(payment);
    }

    async fn begin(&self, op: Op) -> BillsyncResult<Option<ProviderResponse>> {
        let mut state = self.state.write().await;
        *state.calls.entry(op).or_default() += 1;
        match state.scripted.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(Scripted::Respond(response)) => Ok(Some(response)),
            Some(Scripted::TransportError) => Err(BillsyncError::gateway(
                "provider request failed",
            )
            .with_details(format!("mock transport failure on {op:?}"))),
            None => Ok(None),
        }
    }
}

fn ok(body: Value) -> ProviderResponse {
    ProviderResponse::new(200, body.to_string())
}

fn not_found() -> ProviderResponse {
    ProviderResponse::new(
        404,
        json!({"errors": [{"code": "not_found", "description": "Resource not found"}]})
            .to_string(),
    )
}

fn money(value: Decimal) -> Value {
    json!(value.to_f64().unwrap_or_default())
}

fn merge(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) {
        for (k, v) in patch {
            target.insert(k, v);
        }
    }
}

/// Gateway bound to one credential of a [`MockProvider`].
#[derive(Clone)]
pub struct MockGateway {
    provider: MockProvider,
    credential_id: Uuid,
}

impl MockGateway {
    pub fn credential_id(&self) -> Uuid {
        self.credential_id
    }
}

impl PaymentGateway for MockGateway {
    async fn create_customer(&self, input: &NewCustomer) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::CreateCustomer).await? {
            return Ok(scripted);
        }
        let mut state = self.provider.state.write().await;
        let id = state.next_id("cus");
        let mut customer = serde_json::to_value(input)
            .map_err(|e| BillsyncError::Internal(e.to_string()))?;
        merge(&mut customer, json!({"object": "customer", "id": id}));
        state.customers.insert(id, customer.clone());
        Ok(ok(customer))
    }

    async fn get_customer(&self, customer_id: &str) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::GetCustomer).await? {
            return Ok(scripted);
        }
        let state = self.provider.state.read().await;
        Ok(state
            .customers
            .get(customer_id)
            .cloned()
            .map(ok)
            .unwrap_or_else(not_found))
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        input: &CustomerUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::UpdateCustomer).await? {
            return Ok(scripted);
        }
        let patch =
            serde_json::to_value(input).map_err(|e| BillsyncError::Internal(e.to_string()))?;
        let mut state = self.provider.state.write().await;
        match state.customers.get_mut(customer_id) {
            Some(customer) => {
                merge(customer, patch);
                Ok(ok(customer.clone()))
            }
            None => Ok(not_found()),
        }
    }

    async fn create_charge(&self, input: &NewCharge) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::CreateCharge).await? {
            return Ok(scripted);
        }
        let mut state = self.provider.state.write().await;

        let count = input.installment_count.filter(|n| *n > 1).unwrap_or(1);
        let installment = (count > 1).then(|| state.next_id("ins"));
        let per_installment = match (input.installment_value, input.total_value) {
            (Some(value), _) => value,
            (None, Some(total)) => (total / Decimal::from(count)).round_dp(2),
            (None, None) if count > 1 => (input.value / Decimal::from(count)).round_dp(2),
            (None, None) => input.value,
        };

        let mut created = Vec::with_capacity(count as usize);
        for n in 0..count {
            let id = state.next_id("pay");
            let due = input
                .due_date
                .checked_add_months(Months::new(n as u32))
                .unwrap_or(input.due_date);
            let mut payment = json!({
                "object": "payment",
                "id": id,
                "customer": input.customer,
                "value": money(per_installment),
                "netValue": money(per_installment),
                "billingType": input.billing_type.as_str(),
                "status": "PENDING",
                "dueDate": due.to_string(),
                "originalDueDate": due.to_string(),
                "description": input.description.clone().unwrap_or_default(),
                "externalReference": input.external_reference,
                "invoiceUrl": format!("https://sandbox.asaas.com/i/{id}"),
                "invoiceNumber": format!("{:08}", state.sequence),
            });
            if let Some(installment) = &installment {
                merge(
                    &mut payment,
                    json!({"installment": installment, "installmentNumber": n + 1}),
                );
            }
            created.push(payment);
        }

        let first = created.first().cloned().unwrap_or(Value::Null);
        state.payments.extend(created);
        Ok(ok(first))
    }

    async fn get_charge(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::GetCharge).await? {
            return Ok(scripted);
        }
        Ok(self
            .provider
            .payment(charge_id)
            .await
            .map(ok)
            .unwrap_or_else(not_found))
    }

    async fn update_charge(
        &self,
        charge_id: &str,
        input: &ChargeUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::UpdateCharge).await? {
            return Ok(scripted);
        }
        let patch =
            serde_json::to_value(input).map_err(|e| BillsyncError::Internal(e.to_string()))?;
        let mut state = self.provider.state.write().await;
        match state.payments.iter_mut().find(|p| p["id"] == charge_id) {
            Some(payment) => {
                merge(payment, patch);
                Ok(ok(payment.clone()))
            }
            None => Ok(not_found()),
        }
    }

    async fn delete_charge(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::DeleteCharge).await? {
            return Ok(scripted);
        }
        let mut state = self.provider.state.write().await;
        let before = state.payments.len();
        state.payments.retain(|p| p["id"] != charge_id);
        if state.payments.len() == before {
            return Ok(not_found());
        }
        Ok(ok(json!({"deleted": true, "id": charge_id})))
    }

    async fn list_charges(&self, query: &ChargeQuery) -> BillsyncResult<ProviderResponse> {
        self.provider
            .state
            .write()
            .await
            .list_queries
            .push(query.clone());
        if let Some(scripted) = self.provider.begin(Op::ListCharges).await? {
            return Ok(scripted);
        }

        let state = self.provider.state.read().await;
        let filters = [
            ("customer", "customer"),
            ("installment", "installment"),
            ("externalReference", "externalReference"),
            ("status", "status"),
            ("billingType", "billingType"),
        ];
        let matching: Vec<Value> = state
            .payments
            .iter()
            .filter(|p| {
                filters.iter().all(|(param, field)| match query.get(param) {
                    Some(expected) => p[*field].as_str() == Some(expected),
                    None => true,
                })
            })
            .cloned()
            .collect();

        let offset: usize = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
        let total = matching.len();
        let page: Vec<Value> = matching.into_iter().skip(offset).take(limit).collect();

        Ok(ok(json!({
            "object": "list",
            "hasMore": offset + page.len() < total,
            "totalCount": total,
            "limit": limit,
            "offset": offset,
            "data": page,
        })))
    }

    async fn identification_field(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::IdentificationField).await? {
            return Ok(scripted);
        }
        Ok(match self.provider.payment(charge_id).await {
            Some(_) => ok(json!({
                "identificationField": "00190000090280011904100000001237800000015000",
                "nossoNumero": "6543",
                "barCode": "00198000000001500000000000000000000000000000",
            })),
            None => not_found(),
        })
    }

    async fn pix_qr_code(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        if let Some(scripted) = self.provider.begin(Op::PixQrCode).await? {
            return Ok(scripted);
        }
        Ok(match self.provider.payment(charge_id).await {
            Some(_) => {
                let mut body = Map::new();
                body.insert("encodedImage".into(), json!("iVBORw0KGgo="));
                body.insert("payload".into(), json!(format!("00020101021226-{charge_id}")));
                body.insert("expirationDate".into(), json!("2025-03-11 23:59:59"));
                ok(Value::Object(body))
            }
            None => not_found(),
        })
    }
}

/// [`GatewayFactory`] for [`MockProvider`].
#[derive(Clone, Default)]
pub struct MockConnector {
    provider: MockProvider,
}

impl MockConnector {
    pub fn new(provider: MockProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &MockProvider {
        &self.provider
    }
}

impl GatewayFactory for MockConnector {
    type Gateway = MockGateway;

    fn connect(&self, credential: &ResolvedCredential) -> BillsyncResult<MockGateway> {
        // Synchronous trait method; a contended lock only loses the record.
        if let Ok(mut state) = self.provider.state.try_write() {
            state.connected.push(credential.id);
        }
        Ok(MockGateway {
            provider: self.provider.clone(),
            credential_id: credential.id,
        })
    }
}
