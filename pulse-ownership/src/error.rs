//! Error types for the ownership layer.
//!
//! An ownership conflict is not represented here: a server rejection is a
//! first-class outcome (`SyncOutcome::Rejected` / `RestoreOutcome::Rejected`),
//! never an error, and is never retried automatically.

use thiserror::Error;

/// Result type for ownership operations.
pub type OwnershipResult<T> = Result<T, OwnershipError>;

/// Errors that can occur talking to the ownership ledger or the billing
/// collaborator. All of these are transient probe failures from the
/// override's point of view: they never mutate the persisted override.
#[derive(Debug, Error)]
pub enum OwnershipError {
    /// No backend endpoint is configured for this build.
    #[error("backend endpoint not configured")]
    ConfigurationMissing,

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// Local store read/write failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The billing collaborator failed to replay the purchase restore.
    #[error("billing error: {0}")]
    Billing(String),
}
