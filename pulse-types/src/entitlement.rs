//! Entitlement snapshots from the billing collaborator.
//!
//! The snapshot is the billing SDK's local belief about an active
//! subscription. It is ephemeral and advisory: the ownership ledger, not
//! the billing cache, decides which account a purchase belongs to.

use crate::tier::SubscriptionTier;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// The platform store a purchase was made through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    AppStore,
    PlayStore,
    #[serde(other)]
    Unknown,
}

impl StoreKind {
    /// Returns the wire representation of this store.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppStore => "app_store",
            Self::PlayStore => "play_store",
            Self::Unknown => "unknown",
        }
    }
}

/// A read-only snapshot of the platform billing subscription state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementSnapshot {
    /// Tier granted by the entitlement.
    pub tier: SubscriptionTier,
    /// Store product identifier.
    pub product_id: String,
    /// Store the purchase was made through.
    pub store: StoreKind,
    /// Expiry, when the subscription is time-limited.
    pub expires_at: Option<DateTime<Utc>>,
    /// Date of the original purchase that started this subscription chain.
    pub original_purchase_date: Option<DateTime<Utc>>,
    /// Whether the subscription is set to auto-renew.
    pub will_renew: bool,
    /// Set when the store reported a billing problem.
    pub billing_issue_detected_at: Option<DateTime<Utc>>,
}

impl EntitlementSnapshot {
    /// Derives the join key to the ownership ledger.
    ///
    /// The billing SDK does not expose the store transaction id directly,
    /// so the key is derived deterministically from the product id and the
    /// original purchase date. A missing purchase date maps to the literal
    /// `"unknown"` so the same entitlement always derives the same key.
    #[must_use]
    pub fn original_transaction_id(&self) -> String {
        let date = self
            .original_purchase_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| "unknown".to_string());
        format!("{}_{}", self.product_id, date)
    }
}
