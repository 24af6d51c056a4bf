//! Subscription tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The subscription tier of an account or entitlement.
///
/// Ordered: `Free < Pro < Premium`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// No paid subscription.
    #[default]
    Free,
    /// Pro subscription.
    Pro,
    /// Premium subscription.
    Premium,
}

impl SubscriptionTier {
    /// Returns true for any tier other than Free.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Returns the wire representation of this tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    /// Lenient decode: unknown tier strings fall back to Free so a newer
    /// backend cannot grant an unrecognized tier by accident.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "pro" => Self::Pro,
            "premium" => Self::Premium,
            _ => Self::Free,
        })
    }
}
