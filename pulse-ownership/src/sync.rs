//! Claim sync coordination.
//!
//! Drives an ownership claim after every login / purchase / restore /
//! foreground event, with three protections:
//! - a dedup window: an identical (account, tier, expiry, transaction)
//!   tuple is not resubmitted within the cool-down,
//! - request fencing: each claim carries a monotonic sequence number and a
//!   late-arriving stale response is discarded,
//! - session fencing: a claim outlived by its session (logout, account
//!   switch) is discarded, never applied to the new session.
//!
//! Transport and server faults are fail-open: the override is only ever
//! set from an explicit rejection, never from a failed probe.

use crate::error::OwnershipError;
use crate::ledger::{ClaimAction, OwnershipLedger};
use crate::override_store::OverrideStore;
use pulse_types::{AccountId, EntitlementSnapshot, SubscriptionTier};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Default dedup window for identical claims.
pub const CLAIM_COOLDOWN: Duration = Duration::from_secs(30);

/// Monotonic session epoch. Bumped on logout/account-switch so that
/// in-flight results from a dead session are discarded.
#[derive(Debug, Clone, Default)]
pub struct SessionEpoch(Arc<AtomicU64>);

impl SessionEpoch {
    /// Returns the current epoch.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Starts a new epoch, invalidating outstanding work.
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns true when `snapshot` is still the current epoch.
    #[must_use]
    pub fn is_current(&self, snapshot: u64) -> bool {
        self.current() == snapshot
    }
}

/// Terminal outcome of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to claim (free tier, dedup window, or a stale/dead-session
    /// response that was discarded).
    Skipped,
    /// The claim was accepted (`claimed` or `updated`).
    Success,
    /// A different account owns the transaction. The override is now set.
    Rejected { owner: Option<AccountId> },
    /// Transport/server fault, or an unrecognized server action. The
    /// override was not touched.
    Failed { reason: String },
}

/// Throttle + fencing state.
#[derive(Debug, Default)]
struct ClaimGate {
    last_key: Option<String>,
    last_at: Option<Instant>,
    next_seq: u64,
    settled_seq: u64,
}

/// Coordinates ownership claims for one session.
pub struct SyncCoordinator {
    ledger: OwnershipLedger,
    overrides: Arc<RwLock<OverrideStore>>,
    epoch: SessionEpoch,
    gate: Mutex<ClaimGate>,
    cooldown: Duration,
}

impl SyncCoordinator {
    /// Creates a coordinator with the default cool-down.
    pub fn new(
        ledger: OwnershipLedger,
        overrides: Arc<RwLock<OverrideStore>>,
        epoch: SessionEpoch,
    ) -> Self {
        Self::with_cooldown(ledger, overrides, epoch, CLAIM_COOLDOWN)
    }

    /// Creates a coordinator with a custom cool-down (tests).
    pub fn with_cooldown(
        ledger: OwnershipLedger,
        overrides: Arc<RwLock<OverrideStore>>,
        epoch: SessionEpoch,
        cooldown: Duration,
    ) -> Self {
        Self {
            ledger,
            overrides,
            epoch,
            gate: Mutex::new(ClaimGate::default()),
            cooldown,
        }
    }

    /// Submits an ownership claim for the current entitlement.
    pub async fn sync(
        &self,
        account_id: &AccountId,
        entitlement: Option<&EntitlementSnapshot>,
    ) -> SyncOutcome {
        let Some(snapshot) = entitlement.filter(|e| e.tier.is_paid()) else {
            debug!("sync skipped: no paid entitlement");
            return SyncOutcome::Skipped;
        };
        let transaction_id = snapshot.original_transaction_id();
        let key = format!(
            "{}|{}|{}|{}",
            account_id,
            snapshot.tier,
            snapshot
                .expires_at
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            transaction_id,
        );

        let epoch_snapshot = self.epoch.current();
        let seq = {
            let mut gate = self.gate.lock().await;
            let within_cooldown = gate.last_key.as_deref() == Some(key.as_str())
                && gate.last_at.is_some_and(|at| at.elapsed() < self.cooldown);
            if within_cooldown {
                debug!(%key, "sync skipped: identical claim within cool-down");
                return SyncOutcome::Skipped;
            }
            gate.next_seq += 1;
            gate.next_seq
        };

        let result = self
            .ledger
            .claim(
                account_id,
                snapshot.tier,
                snapshot.expires_at,
                &transaction_id,
                snapshot.store,
                &snapshot.product_id,
            )
            .await;

        // Settle under the gate so stale or dead-session responses can
        // never overwrite newer state.
        let mut gate = self.gate.lock().await;
        if !self.epoch.is_current(epoch_snapshot) {
            debug!(seq, "discarding claim response from an ended session");
            return SyncOutcome::Skipped;
        }
        if seq <= gate.settled_seq {
            debug!(seq, settled = gate.settled_seq, "discarding stale claim response");
            return SyncOutcome::Skipped;
        }

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "claim failed; override untouched");
                return SyncOutcome::Failed { reason: e.to_string() };
            }
        };

        match response.action {
            ClaimAction::Rejected => {
                gate.settled_seq = seq;
                let owner = response.owner;
                if let Err(e) = self.overrides.write().await.mark_rejected(owner.clone()) {
                    warn!(error = %e, "failed to persist ownership override");
                }
                SyncOutcome::Rejected { owner }
            }
            ClaimAction::Claimed | ClaimAction::Updated => {
                gate.settled_seq = seq;
                gate.last_key = Some(key);
                gate.last_at = Some(Instant::now());
                if let Err(e) = self.overrides.write().await.clear() {
                    warn!(error = %e, "failed to persist override clear");
                }
                info!(%account_id, action = ?response.action, "subscription claim accepted");
                SyncOutcome::Success
            }
            ClaimAction::Unknown => SyncOutcome::Failed {
                reason: "unrecognized claim action".to_string(),
            },
        }
    }

    /// Resolves the tier that feature gating should honor.
    ///
    /// A confirmed server rejection always wins; a live billing entitlement
    /// wins next; the account-recorded tier is the last resort (covers
    /// purchase channels that bypass the billing cache entirely).
    pub async fn effective_tier(
        &self,
        entitlement: Option<&EntitlementSnapshot>,
        account_fallback: SubscriptionTier,
    ) -> SubscriptionTier {
        if self.overrides.read().await.get().is_rejected() {
            return SubscriptionTier::Free;
        }
        match entitlement {
            Some(e) if e.tier.is_paid() => e.tier,
            _ => account_fallback,
        }
    }

    /// Storage-level error passthrough for callers that need to surface a
    /// failed override clear.
    pub(crate) fn overrides(&self) -> &Arc<RwLock<OverrideStore>> {
        &self.overrides
    }

    pub(crate) fn epoch(&self) -> &SessionEpoch {
        &self.epoch
    }

    pub(crate) fn ledger(&self) -> &OwnershipLedger {
        &self.ledger
    }
}

// Transparent conversion for orchestrator call sites that want the claim
// error as an outcome reason.
impl From<OwnershipError> for SyncOutcome {
    fn from(e: OwnershipError) -> Self {
        Self::Failed { reason: e.to_string() }
    }
}
