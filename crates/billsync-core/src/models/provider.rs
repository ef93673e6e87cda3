//! Provider naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical, upper-case provider code as stored in credential and charge
/// rows (e.g. `ASAAS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderCode(String);

impl ProviderCode {
    pub const ASAAS: &'static str = "ASAAS";

    pub fn asaas() -> Self {
        Self(Self::ASAAS.to_string())
    }

    /// Normalize a free-form provider name.
    ///
    /// Names are trimmed and upper-cased. Anything spelled `ASAAS…` or the
    /// common typo `ASSAS…` collapses to `ASAAS`; otherwise an environment
    /// suffix after the first `_` (e.g. `PAGARME_SANDBOX`) is dropped.
    pub fn normalize(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        if upper.starts_with("ASAAS") || upper.starts_with("ASSAS") {
            return Self::asaas();
        }
        match upper.find('_') {
            Some(i) if i > 0 => Self(upper[..i].to_string()),
            _ => Self(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
