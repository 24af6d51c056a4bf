//! Restore orchestration.
//!
//! Composes billing restore → ownership verify → claim into one terminal
//! outcome. The read-only verify step exists so the UI can present an
//! ownership-conflict screen (copyable owner id, "switch account" CTA)
//! before any write occurs.

use crate::error::OwnershipResult;
use crate::sync::{SyncCoordinator, SyncOutcome};
use async_trait::async_trait;
use pulse_types::{AccountId, EntitlementSnapshot};
use std::sync::Arc;
use tracing::{info, warn};

/// Seam to the platform billing collaborator.
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Replays the platform purchase restore and returns the resulting
    /// active entitlement, if any.
    async fn restore_purchases(&self) -> OwnershipResult<Option<EntitlementSnapshot>>;

    /// Returns the billing cache's current belief without a replay.
    async fn current_entitlement(&self) -> Option<EntitlementSnapshot>;
}

/// Terminal outcome of a restore. Exactly one of these resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The restored purchase is claimed by this account.
    Success,
    /// A different account owns the purchase. The override is now set.
    Rejected { owner: Option<AccountId> },
    /// No entitlement to restore, or a transport/billing fault.
    Failed { reason: String },
}

/// Outcome of a read-only ownership probe (account setup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The billing replay produced no active entitlement.
    NoEntitlement,
    /// The transaction is unclaimed or already owned by the probing id.
    Available,
    /// Another account owns the transaction; the user should be redirected
    /// to it instead of creating a duplicate account.
    OwnedElsewhere { owner: Option<AccountId> },
}

/// Drives restore → verify → claim.
pub struct RestoreOrchestrator {
    billing: Arc<dyn BillingGateway>,
    coordinator: Arc<SyncCoordinator>,
}

impl RestoreOrchestrator {
    /// Creates an orchestrator over the billing seam and the coordinator.
    pub fn new(billing: Arc<dyn BillingGateway>, coordinator: Arc<SyncCoordinator>) -> Self {
        Self { billing, coordinator }
    }

    /// Runs a full restore for `account_id`.
    pub async fn restore(&self, account_id: &AccountId) -> RestoreOutcome {
        let epoch_snapshot = self.coordinator.epoch().current();

        let snapshot = match self.billing.restore_purchases().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                // Stale knowledge beats a blind failure: if a prior
                // rejection recorded the owner, surface it.
                let overrides = self.coordinator.overrides().read().await;
                if let Some(owner) = overrides.get().owner().cloned() {
                    return RestoreOutcome::Rejected { owner: Some(owner) };
                }
                return RestoreOutcome::Failed {
                    reason: "no active subscription to restore".to_string(),
                };
            }
            Err(e) => {
                return RestoreOutcome::Failed { reason: e.to_string() };
            }
        };

        let transaction_id = snapshot.original_transaction_id();
        match self
            .coordinator
            .ledger()
            .verify_restore(account_id.as_str(), &transaction_id)
            .await
        {
            Ok(verdict) if !verdict.allowed => {
                if !self.coordinator.epoch().is_current(epoch_snapshot) {
                    return RestoreOutcome::Failed {
                        reason: "session ended during restore".to_string(),
                    };
                }
                let owner = verdict.owner;
                if let Err(e) = self
                    .coordinator
                    .overrides()
                    .write()
                    .await
                    .mark_rejected(owner.clone())
                {
                    warn!(error = %e, "failed to persist ownership override");
                }
                info!(owner = ?owner.as_ref().map(AccountId::as_str), "restore rejected by ownership pre-check");
                return RestoreOutcome::Rejected { owner };
            }
            Ok(_) => {}
            Err(e) => {
                // The claim call enforces the same invariant
                // authoritatively, so a failed pre-check is non-fatal.
                warn!(error = %e, "verify_restore failed, proceeding to claim");
            }
        }

        match self.coordinator.sync(account_id, Some(&snapshot)).await {
            // A dedup skip means an identical claim just succeeded.
            SyncOutcome::Success | SyncOutcome::Skipped => RestoreOutcome::Success,
            SyncOutcome::Rejected { owner } => RestoreOutcome::Rejected { owner },
            SyncOutcome::Failed { reason } => RestoreOutcome::Failed { reason },
        }
    }

    /// Read-only ownership probe for onboarding: replays the billing
    /// restore and verifies with a caller-chosen (possibly sentinel)
    /// account id. Never writes to the ledger or the override.
    pub async fn probe_ownership(&self, account_id: &str) -> OwnershipResult<ProbeOutcome> {
        let Some(snapshot) = self.billing.restore_purchases().await? else {
            return Ok(ProbeOutcome::NoEntitlement);
        };
        let transaction_id = snapshot.original_transaction_id();
        let verdict = self
            .coordinator
            .ledger()
            .verify_restore(account_id, &transaction_id)
            .await?;
        if verdict.allowed {
            Ok(ProbeOutcome::Available)
        } else {
            Ok(ProbeOutcome::OwnedElsewhere { owner: verdict.owner })
        }
    }

    pub(crate) fn billing(&self) -> &Arc<dyn BillingGateway> {
        &self.billing
    }
}
