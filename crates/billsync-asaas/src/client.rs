//! Asaas REST client (`/v3` API).

use std::time::Duration;

use billsync_core::error::BillsyncResult;
use billsync_core::gateway::{GatewayFactory, PaymentGateway, ProviderResponse};
use billsync_core::models::credential::ResolvedCredential;
use billsync_core::models::customer::{CustomerUpdate, NewCustomer};
use billsync_core::models::payment::{ChargeQuery, ChargeUpdate, NewCharge};
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::AsaasError;

/// Outbound timeout applied to every provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds [`AsaasClient`]s that share one connection pool.
#[derive(Clone)]
pub struct AsaasConnector {
    http: reqwest::Client,
}

impl AsaasConnector {
    pub fn new(timeout: Duration) -> Result<Self, AsaasError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl GatewayFactory for AsaasConnector {
    type Gateway = AsaasClient;

    fn connect(&self, credential: &ResolvedCredential) -> BillsyncResult<AsaasClient> {
        Ok(AsaasClient::with_http(
            self.http.clone(),
            &credential.base_url,
            &credential.token,
        )?)
    }
}

/// Client bound to one account's base URL and API token.
#[derive(Clone)]
pub struct AsaasClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl AsaasClient {
    /// Create a client with its own connection pool.
    pub fn new(base_url: &str, token: &str) -> Result<Self, AsaasError> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Self::with_http(http, base_url, token)
    }

    /// Create a client on an existing pool.
    ///
    /// The base URL loses any trailing `/`; a pasted `Bearer ` prefix on
    /// the token is removed since the provider expects the raw key.
    pub fn with_http(http: reqwest::Client, base_url: &str, token: &str) -> Result<Self, AsaasError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(AsaasError::Config("asaas base URL is empty".into()));
        }
        let base_url = Url::parse(base)
            .map_err(|e| AsaasError::Config(format!("invalid asaas base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AsaasError::Config(format!("invalid asaas base URL: {base}")));
        }

        let token = strip_bearer(token.trim_start()).trim();
        if token.is_empty() {
            return Err(AsaasError::Config("asaas token is empty".into()));
        }

        Ok(Self {
            http,
            base_url,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected at construction.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v3").extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(segments))
            .header("access_token", &self.token)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
    }

    fn with_json<T: Serialize + ?Sized>(
        builder: RequestBuilder,
        body: &T,
    ) -> Result<RequestBuilder, AsaasError> {
        let payload = serde_json::to_vec(body)?;
        Ok(builder
            .header("Content-Type", "application/json")
            .body(payload))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<ProviderResponse, AsaasError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(%method, path = %path, status, bytes = body.len(), "Asaas response");

        Ok(ProviderResponse::new(status, body))
    }
}

fn strip_bearer(token: &str) -> &str {
    token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token)
}

impl PaymentGateway for AsaasClient {
    async fn create_customer(&self, input: &NewCustomer) -> BillsyncResult<ProviderResponse> {
        let builder = Self::with_json(self.request(Method::POST, &["customers"]), input)?;
        Ok(self.execute(builder).await?)
    }

    async fn get_customer(&self, customer_id: &str) -> BillsyncResult<ProviderResponse> {
        Ok(self
            .execute(self.request(Method::GET, &["customers", customer_id]))
            .await?)
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        input: &CustomerUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        let builder = Self::with_json(
            self.request(Method::PUT, &["customers", customer_id]),
            input,
        )?;
        Ok(self.execute(builder).await?)
    }

    async fn create_charge(&self, input: &NewCharge) -> BillsyncResult<ProviderResponse> {
        let builder = Self::with_json(self.request(Method::POST, &["payments"]), input)?;
        Ok(self.execute(builder).await?)
    }

    async fn get_charge(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        Ok(self
            .execute(self.request(Method::GET, &["payments", charge_id]))
            .await?)
    }

    async fn update_charge(
        &self,
        charge_id: &str,
        input: &ChargeUpdate,
    ) -> BillsyncResult<ProviderResponse> {
        let builder = Self::with_json(
            self.request(Method::PUT, &["payments", charge_id]),
            input,
        )?;
        Ok(self.execute(builder).await?)
    }

    async fn delete_charge(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        Ok(self
            .execute(self.request(Method::DELETE, &["payments", charge_id]))
            .await?)
    }

    async fn list_charges(&self, query: &ChargeQuery) -> BillsyncResult<ProviderResponse> {
        let mut builder = self.request(Method::GET, &["payments"]);
        if !query.is_empty() {
            builder = builder.query(query.params());
        }
        Ok(self.execute(builder).await?)
    }

    async fn identification_field(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        Ok(self
            .execute(self.request(
                Method::GET,
                &["payments", charge_id, "identificationField"],
            ))
            .await?)
    }

    async fn pix_qr_code(&self, charge_id: &str) -> BillsyncResult<ProviderResponse> {
        Ok(self
            .execute(self.request(Method::GET, &["payments", charge_id, "pixQrCode"]))
            .await?)
    }
}
