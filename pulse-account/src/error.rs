//! Error types for the account layer.

use pulse_types::AccountIdError;
use thiserror::Error;

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;

/// Errors that can occur in account operations.
///
/// Transport faults are fatal for identity-mutating calls: failing open on
/// login or registration would silently authenticate an unverified
/// identity.
#[derive(Debug, Error)]
pub enum AccountError {
    /// No backend endpoint is configured for this build.
    #[error("backend endpoint not configured")]
    ConfigurationMissing,

    /// Input failed canonical account id validation.
    #[error(transparent)]
    InvalidFormat(#[from] AccountIdError),

    /// The server reports no such account.
    #[error("account not found")]
    NotFound,

    /// The account still carries a paid tier; deletion requires free.
    #[error("account has a paid tier and cannot be deleted")]
    PaidTier,

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status or envelope error.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Local store read/write failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl AccountError {
    /// Returns true for faults worth retrying later (the stale local
    /// identity is kept across these).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout | Self::Server { .. } | Self::Decoding(_)
        )
    }
}
