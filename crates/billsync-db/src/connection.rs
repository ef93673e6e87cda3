//! PostgREST connection management.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::StoreError;

/// Configuration for connecting to the tenant data store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project URL (e.g., `https://xyz.supabase.co`). `/rest/v1` is appended.
    pub url: String,
    /// Service API key, sent both as `apikey` and as bearer token.
    pub api_key: String,
    /// Value of the `X-Client-Info` header.
    pub client_info: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".into(),
            api_key: String::new(),
            client_info: "billsync-charges-service".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Database schemas exposed through PostgREST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Iam,
    Company,
    Public,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iam => "iam",
            Self::Company => "company",
            Self::Public => "public",
        }
    }
}

/// Shared PostgREST client. Cheap to clone.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    client_info: String,
}

impl StoreClient {
    /// Build a client for the configured project.
    ///
    /// No request is made; connectivity problems surface on first use.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config.url.trim().trim_end_matches('/');
        let api_key = config.api_key.trim();
        if url.is_empty() || api_key.is_empty() {
            return Err(StoreError::Config(
                "SUPABASE_URL and SUPABASE_KEY are required".into(),
            ));
        }

        info!(url = %url, timeout_secs = config.timeout.as_secs(), "Configuring data store client");

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            rest_url: format!("{url}/rest/v1"),
            api_key: api_key.to_string(),
            client_info: config.client_info.clone(),
        })
    }

    /// `GET /{table}` with PostgREST filter parameters.
    pub async fn select<T: DeserializeOwned>(
        &self,
        schema: Schema,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let operation = format!("select {}.{table}", schema.as_str());
        let body = self
            .send(
                &operation,
                self.request(Method::GET, table, schema).query(query),
            )
            .await?;
        serde_json::from_str(&body).map_err(|source| StoreError::Decode { operation, source })
    }

    /// `POST /{table}` merging duplicates on the given conflict columns.
    pub async fn upsert<T: Serialize + ?Sized>(
        &self,
        schema: Schema,
        table: &str,
        on_conflict: &str,
        rows: &T,
    ) -> Result<(), StoreError> {
        let operation = format!("upsert {}.{table}", schema.as_str());
        let builder = self
            .request(Method::POST, table, schema)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        self.send(&operation, builder).await?;
        Ok(())
    }

    /// `DELETE /{table}` with PostgREST filter parameters.
    pub async fn delete(
        &self,
        schema: Schema,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<(), StoreError> {
        let operation = format!("delete {}.{table}", schema.as_str());
        let builder = self
            .request(Method::DELETE, table, schema)
            .query(query)
            .header("Prefer", "return=minimal");
        self.send(&operation, builder).await?;
        Ok(())
    }

    /// Call an RPC under the `public` schema and return the trimmed body.
    pub async fn rpc(&self, name: &str, args: &serde_json::Value) -> Result<String, StoreError> {
        let operation = format!("rpc {name}");
        let builder = self
            .request(Method::POST, &format!("rpc/{name}"), Schema::Public)
            .json(args);
        let body = self.send(&operation, builder).await?;
        Ok(body.trim().to_string())
    }

    fn request(&self, method: Method, path: &str, schema: Schema) -> RequestBuilder {
        // PostgREST reads the schema from Accept-Profile on reads and
        // Content-Profile on writes.
        let profile_header = if method == Method::GET {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };
        self.http
            .request(method, format!("{}/{path}", self.rest_url))
            .header(profile_header, schema.as_str())
            .header("Accept", "application/json")
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("X-Client-Info", &self.client_info)
    }

    async fn send(&self, operation: &str, builder: RequestBuilder) -> Result<String, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(operation, status = status.as_u16(), "Data store response");

        if !status.is_success() {
            return Err(StoreError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}
