//! The session object.
//!
//! One explicit, process-lifetime owner for identity and ownership state,
//! constructed at startup and passed by handle to all consumers. Replaces
//! ad hoc global singletons: identity-mutating calls are serialized
//! through one lock, and a session epoch fences out results that arrive
//! after logout or an account switch.

use crate::error::OwnershipResult;
use crate::ledger::OwnershipLedger;
use crate::override_store::{OverrideStore, OwnershipOverride};
use crate::restore::{BillingGateway, ProbeOutcome, RestoreOrchestrator, RestoreOutcome};
use crate::sync::{SessionEpoch, SyncCoordinator, SyncOutcome};
use pulse_account::{AccountManager, AccountResult, AccountStore};
use pulse_types::{AccountIdentity, ApiConfig, SubscriptionTier};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// The event that triggered a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    LoggedIn,
    PurchaseCompleted,
    RestoreCompleted,
    Foregrounded,
}

/// Session-scoped owner of the account and ownership state.
pub struct Session {
    account: Arc<AccountManager>,
    coordinator: Arc<SyncCoordinator>,
    orchestrator: RestoreOrchestrator,
    overrides: Arc<RwLock<OverrideStore>>,
    epoch: SessionEpoch,
    op_lock: Mutex<()>,
}

impl Session {
    /// Builds a session over opened stores and the billing seam.
    pub fn new(
        config: ApiConfig,
        account_store: AccountStore,
        override_store: OverrideStore,
        billing: Arc<dyn BillingGateway>,
        device_name: impl Into<String>,
    ) -> Self {
        let overrides = Arc::new(RwLock::new(override_store));
        let epoch = SessionEpoch::default();
        let coordinator = Arc::new(SyncCoordinator::new(
            OwnershipLedger::new(config.clone()),
            Arc::clone(&overrides),
            epoch.clone(),
        ));
        let orchestrator = RestoreOrchestrator::new(billing, Arc::clone(&coordinator));
        Self {
            account: Arc::new(AccountManager::new(config, account_store, device_name)),
            coordinator,
            orchestrator,
            overrides,
            epoch,
            op_lock: Mutex::new(()),
        }
    }

    /// The account manager, for identity reads and device management.
    #[must_use]
    pub fn account(&self) -> &AccountManager {
        &self.account
    }

    /// The current override state (already loaded from durable storage, so
    /// tier-gated decisions can consult it before any network settles).
    pub async fn override_state(&self) -> OwnershipOverride {
        self.overrides.read().await.get().clone()
    }

    /// Restores a persisted identity at launch and reconciles ownership.
    pub async fn launch(&self) -> AccountResult<Option<AccountIdentity>> {
        let _guard = self.op_lock.lock().await;
        let identity = self.account.restore_at_launch().await?;
        if identity.is_some() {
            self.run_sync(SyncEvent::Foregrounded).await;
        }
        Ok(identity)
    }

    /// Creates a fresh account and runs the first sync for it.
    pub async fn create_account(&self) -> AccountResult<AccountIdentity> {
        let _guard = self.op_lock.lock().await;
        self.begin_identity_change().await;
        let identity = self.account.create_identity().await?;
        self.run_sync(SyncEvent::LoggedIn).await;
        Ok(identity)
    }

    /// Logs in with a user-supplied id and runs the first sync for it.
    pub async fn login(&self, raw: &str) -> AccountResult<AccountIdentity> {
        let _guard = self.op_lock.lock().await;
        self.begin_identity_change().await;
        let identity = self.account.login(raw).await?;
        self.run_sync(SyncEvent::LoggedIn).await;
        Ok(identity)
    }

    /// Switches to a different account without a full logout. The override
    /// is cleared before the new identity's first sync runs: a fresh
    /// identity deserves a fresh probe.
    pub async fn switch_account(&self, raw: &str) -> AccountResult<AccountIdentity> {
        info!("switching account");
        self.login(raw).await
    }

    /// Logs out, discarding any outstanding sync/restore results.
    pub async fn logout(&self) -> AccountResult<()> {
        let _guard = self.op_lock.lock().await;
        self.begin_identity_change().await;
        self.account.logout().await
    }

    /// Deletes the account (free tier only) and clears all session state.
    pub async fn delete_account(&self) -> AccountResult<()> {
        let _guard = self.op_lock.lock().await;
        self.account.delete_identity().await?;
        self.begin_identity_change().await;
        Ok(())
    }

    /// Runs a sync for the given trigger.
    pub async fn sync_after(&self, event: SyncEvent) -> SyncOutcome {
        let _guard = self.op_lock.lock().await;
        self.run_sync(event).await
    }

    /// Runs a full restore for the current account.
    pub async fn restore(&self) -> RestoreOutcome {
        let _guard = self.op_lock.lock().await;
        let Some(account_id) = self.account.account_id().await else {
            return RestoreOutcome::Failed { reason: "no account".to_string() };
        };
        let outcome = self.orchestrator.restore(&account_id).await;
        debug!(?outcome, "restore finished");
        outcome
    }

    /// Read-only ownership probe for onboarding, with a sentinel id.
    pub async fn probe_ownership(&self, account_id: &str) -> OwnershipResult<ProbeOutcome> {
        self.orchestrator.probe_ownership(account_id).await
    }

    /// Resolves the tier that feature gating should honor right now.
    pub async fn effective_tier(&self) -> SubscriptionTier {
        let entitlement = self.orchestrator.billing().current_entitlement().await;
        let fallback = self
            .account
            .identity()
            .await
            .map(|i| i.tier)
            .unwrap_or_default();
        self.coordinator
            .effective_tier(entitlement.as_ref(), fallback)
            .await
    }

    /// Starts a new epoch and clears the override. Run before and after
    /// every identity change so no stale state crosses sessions.
    async fn begin_identity_change(&self) {
        self.epoch.bump();
        if let Err(e) = self.overrides.write().await.clear() {
            warn!(error = %e, "failed to clear ownership override");
        }
    }

    async fn run_sync(&self, event: SyncEvent) -> SyncOutcome {
        let Some(account_id) = self.account.account_id().await else {
            return SyncOutcome::Skipped;
        };
        let entitlement = self.orchestrator.billing().current_entitlement().await;
        debug!(?event, %account_id, "sync triggered");
        self.coordinator.sync(&account_id, entitlement.as_ref()).await
    }
}
