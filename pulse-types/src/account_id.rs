//! The canonical account id.
//!
//! The account id string is the account's sole credential — possession
//! grants control, no password exists. Input handling is therefore split
//! the same way license-key parsing is: a lenient normalization pass that
//! accepts whatever the user pasted, followed by a single strict grammar
//! match. Canonical form: `VPN-XXXX-XXXX-XXXX` with uppercase alphanumeric
//! groups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed prefix of every canonical account id.
pub const ACCOUNT_ID_PREFIX: &str = "VPN";

/// Number of content groups in a canonical id.
const GROUP_COUNT: usize = 3;

/// Characters per content group.
const GROUP_LEN: usize = 4;

/// Maximum total length of a normalized id (safety cap).
const MAX_LEN: usize = 19;

/// Error for account id parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountIdError {
    /// Input does not normalize to the canonical grammar.
    #[error("invalid account id format: {0:?}")]
    InvalidFormat(String),
}

/// A canonical account id (`VPN-XXXX-XXXX-XXXX`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Parses user input into a canonical account id.
    ///
    /// Normalization is lenient (separators, case, and an existing prefix
    /// are all tolerated); validation is a single strict grammar match.
    ///
    /// # Errors
    ///
    /// Returns [`AccountIdError::InvalidFormat`] when the normalized form
    /// does not match the canonical grammar.
    pub fn parse(raw: &str) -> Result<Self, AccountIdError> {
        let normalized = Self::normalize(raw);
        if Self::is_canonical(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(AccountIdError::InvalidFormat(raw.to_string()))
        }
    }

    /// Normalizes arbitrary input toward the canonical form.
    ///
    /// Strips everything but alphanumerics, uppercases, drops an existing
    /// `VPN` prefix, caps the content at 12 characters, and re-inserts
    /// hyphens every 4 characters behind the restored prefix. Idempotent:
    /// `normalize(normalize(x)) == normalize(x)`.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        let mut content: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if let Some(rest) = content.strip_prefix(ACCOUNT_ID_PREFIX) {
            content = rest.to_string();
        }
        content.truncate(GROUP_COUNT * GROUP_LEN);

        let mut out = String::with_capacity(MAX_LEN);
        out.push_str(ACCOUNT_ID_PREFIX);
        for chunk in content.as_bytes().chunks(GROUP_LEN) {
            out.push('-');
            // chunks of an ASCII string are valid UTF-8
            out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
        }
        out.truncate(MAX_LEN);
        out
    }

    /// Returns true when `s` already matches the canonical grammar exactly.
    #[must_use]
    pub fn is_canonical(s: &str) -> bool {
        let mut parts = s.split('-');
        if parts.next() != Some(ACCOUNT_ID_PREFIX) {
            return false;
        }
        let mut groups = 0;
        for part in parts {
            if part.len() != GROUP_LEN
                || !part.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            {
                return false;
            }
            groups += 1;
        }
        groups == GROUP_COUNT
    }

    /// Returns the canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
