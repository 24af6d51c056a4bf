//! Subscription ownership layer for Pulse.
//!
//! A purchased subscription is bound to the user's platform billing
//! account, not to the Pulse account, so the same purchase can be claimed
//! from more than one install. This crate enforces the one-purchase-to-
//! one-account binding on the client side:
//! - `OwnershipLedger` — claim / verify-restore RPC client against the
//!   backend's ownership-of-record
//! - `OverrideStore` — the persisted rejection override that forces the
//!   free tier while a conflict is unresolved
//! - `SyncCoordinator` — dedup, request fencing, and claim reconciliation
//! - `RestoreOrchestrator` — billing restore → verify → claim pipeline
//! - `Session` — the explicit session object owning all of the above

mod error;
mod ledger;
mod override_store;
mod restore;
mod session;
mod sync;

pub use error::{OwnershipError, OwnershipResult};
pub use ledger::{ClaimAction, ClaimResponse, OwnershipLedger, VerifyRestoreResponse};
pub use override_store::{OverrideStore, OwnershipOverride};
pub use restore::{BillingGateway, ProbeOutcome, RestoreOrchestrator, RestoreOutcome};
pub use session::{Session, SyncEvent};
pub use sync::{SessionEpoch, SyncCoordinator, SyncOutcome, CLAIM_COOLDOWN};
