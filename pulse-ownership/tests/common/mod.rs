//! Shared test helpers for ownership tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pulse_ownership::{BillingGateway, OwnershipError, OwnershipResult};
use pulse_types::{AccountId, ApiConfig, EntitlementSnapshot, StoreKind, SubscriptionTier};
use std::sync::Mutex;

/// API config pointed at a wiremock server.
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
    }
}

/// A premium entitlement with a fixed purchase date.
pub fn premium_entitlement() -> EntitlementSnapshot {
    EntitlementSnapshot {
        tier: SubscriptionTier::Premium,
        product_id: "pulse_premium_yearly".to_string(),
        store: StoreKind::AppStore,
        expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
        original_purchase_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()),
        will_renew: true,
        billing_issue_detected_at: None,
    }
}

/// A free entitlement (nothing to claim).
pub fn free_entitlement() -> EntitlementSnapshot {
    EntitlementSnapshot {
        tier: SubscriptionTier::Free,
        product_id: String::new(),
        store: StoreKind::Unknown,
        expires_at: None,
        original_purchase_date: None,
        will_renew: false,
        billing_issue_detected_at: None,
    }
}

/// Builds an owner id verbatim, the way it arrives on the wire.
pub fn wire_account_id(raw: &str) -> AccountId {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap()
}

/// Scripted billing collaborator.
pub struct MockBilling {
    restore_result: Mutex<Option<OwnershipResult<Option<EntitlementSnapshot>>>>,
    current: Option<EntitlementSnapshot>,
}

impl MockBilling {
    /// Restore succeeds with the given entitlement; `current_entitlement`
    /// reports the same snapshot.
    pub fn with_entitlement(snapshot: EntitlementSnapshot) -> Self {
        Self {
            restore_result: Mutex::new(Some(Ok(Some(snapshot.clone())))),
            current: Some(snapshot),
        }
    }

    /// Restore succeeds but yields nothing.
    pub fn empty() -> Self {
        Self {
            restore_result: Mutex::new(Some(Ok(None))),
            current: None,
        }
    }

    /// Restore fails with a billing error.
    pub fn failing(reason: &str) -> Self {
        Self {
            restore_result: Mutex::new(Some(Err(OwnershipError::Billing(reason.to_string())))),
            current: None,
        }
    }
}

#[async_trait]
impl BillingGateway for MockBilling {
    async fn restore_purchases(&self) -> OwnershipResult<Option<EntitlementSnapshot>> {
        // Results are not Clone (errors), so the script is consumed; tests
        // that restore twice re-arm via a fresh mock.
        self.restore_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Ok(self.current.clone()))
    }

    async fn current_entitlement(&self) -> Option<EntitlementSnapshot> {
        self.current.clone()
    }
}
