//! Server configuration, read from the process environment.

use std::time::Duration;

use billsync_db::StoreConfig;
use billsync_sync::SyncConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (default: 8083).
    pub port: u16,
    /// Allowed CORS origins. `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
    pub store: StoreConfig,
    /// Shared secret for provider webhooks; unset disables the check.
    pub webhook_secret: Option<String>,
    /// Verbose provider logging and error details in responses.
    pub debug: bool,
    /// Timeout of every outbound call (default: 30s).
    pub outbound_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8083,
            cors_allowed_origins: vec!["http://localhost:4200".into()],
            store: StoreConfig::default(),
            webhook_secret: None,
            debug: false,
            outbound_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: v,
            })?,
            None => defaults.port,
        };

        let cors_allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(csv) => csv
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_allowed_origins,
        };

        let outbound_timeout = match get("OUTBOUND_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    key: "OUTBOUND_TIMEOUT_SECS",
                    value: v,
                })?,
            None => defaults.outbound_timeout,
        };

        let store = StoreConfig {
            url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
            api_key: get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
            timeout: outbound_timeout,
            ..defaults.store
        };

        let debug = get("CHARGES_DEBUG")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            cors_allowed_origins,
            store,
            webhook_secret: get("ASAAS_WEBHOOK_SECRET"),
            debug,
            outbound_timeout,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            webhook_secret: self.webhook_secret.clone(),
            debug: self.debug,
            ..SyncConfig::default()
        }
    }
}
