//! Backend endpoint configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the backend RPC endpoint.
///
/// Both the account directory and the ownership ledger speak JSON over
/// authenticated HTTPS POST against the same endpoint. An empty base URL
/// means the backend is not configured for this build; clients treat that
/// as "feature disabled wholesale" rather than failing per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the RPC endpoint (e.g. `https://api.example.com`).
    pub base_url: String,
    /// API key sent with every request.
    pub api_key: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Returns true when a backend endpoint is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// Returns the URL for a named RPC function.
    #[must_use]
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{function}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 15,
        }
    }
}
