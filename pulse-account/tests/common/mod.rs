//! Shared test helpers for account tests.

#![allow(dead_code)]

use pulse_types::ApiConfig;
use serde_json::{json, Value};

/// API config pointed at a wiremock server.
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
    }
}

/// A register_device success envelope for the given canonical id.
pub fn register_success(account_id: &str, tier: &str) -> Value {
    json!({
        "success": true,
        "account": {
            "id": "6b8f3f44-3a86-4a1e-9b6d-6a34c7a4f0e1",
            "account_id": account_id,
            "subscription_tier": tier,
            "max_devices": 3,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-06-01T00:00:00Z",
            "contact_method": null,
            "contact_value": null
        }
    })
}
