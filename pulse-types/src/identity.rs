//! The account identity record.

use crate::account_id::AccountId;
use crate::tier::SubscriptionTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a recovery contact is linked to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Email,
    Telegram,
}

impl ContactMethod {
    /// Returns the wire representation of this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Telegram => "telegram",
        }
    }
}

/// The canonical identity of an account as the directory knows it.
///
/// The `account_id` string is the sole credential; everything else is
/// server-maintained metadata refreshed on each device registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Canonical account id.
    pub account_id: AccountId,
    /// Server record id.
    pub record_id: Uuid,
    /// Tier recorded directly against the account (non-store purchase
    /// channels land here, bypassing the billing cache entirely).
    pub tier: SubscriptionTier,
    /// Device binding limit.
    pub max_devices: u32,
    /// Linked recovery contact, if any.
    pub contact_method: Option<ContactMethod>,
    /// Value of the linked contact (address, handle).
    pub contact_value: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// Last server-side update.
    pub updated_at: Option<DateTime<Utc>>,
}
