//! Account manager — the stateful owner of the local identity.
//!
//! Composes the directory client and the durable store. Callers mutate
//! identity through here only; the session layer serializes those calls.

use crate::directory::AccountDirectory;
use crate::error::{AccountError, AccountResult};
use crate::store::AccountStore;
use pulse_types::{
    AccountId, AccountIdentity, ApiConfig, ContactMethod, DeviceBinding, DeviceType,
    SubscriptionTier,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the local identity: durable store, directory client, and the
/// cached identity record from the last successful registration.
pub struct AccountManager {
    directory: AccountDirectory,
    store: Arc<RwLock<AccountStore>>,
    identity: Arc<RwLock<Option<AccountIdentity>>>,
    device_name: String,
    device_type: DeviceType,
}

impl AccountManager {
    /// Creates a manager over an opened store.
    pub fn new(config: ApiConfig, store: AccountStore, device_name: impl Into<String>) -> Self {
        Self {
            directory: AccountDirectory::new(config),
            store: Arc::new(RwLock::new(store)),
            identity: Arc::new(RwLock::new(None)),
            device_name: device_name.into(),
            device_type: DeviceType::current(),
        }
    }

    /// Returns the stored account id, if any.
    pub async fn account_id(&self) -> Option<AccountId> {
        self.store.read().await.account_id().cloned()
    }

    /// Returns the cached identity from the last successful registration.
    pub async fn identity(&self) -> Option<AccountIdentity> {
        self.identity.read().await.clone()
    }

    /// Returns the stable per-install device id.
    pub async fn device_id(&self) -> AccountResult<String> {
        self.store.write().await.device_id()
    }

    /// Creates a fresh account and binds this device to it.
    ///
    /// All-or-nothing: the local identity is persisted only after both the
    /// account creation and the device registration succeed.
    pub async fn create_identity(&self) -> AccountResult<AccountIdentity> {
        let account_id = self.directory.create_account().await?;
        let identity = self.register_remote(&account_id).await?;
        self.persist_identity(identity.clone()).await?;
        info!(account_id = %identity.account_id, "created account");
        Ok(identity)
    }

    /// Logs in with a user-supplied account id.
    ///
    /// The raw input is normalized leniently and validated strictly; the
    /// id is persisted only after the device registration succeeds.
    pub async fn login(&self, raw: &str) -> AccountResult<AccountIdentity> {
        let account_id = AccountId::parse(raw)?;
        let identity = self.register_remote(&account_id).await?;
        self.persist_identity(identity.clone()).await?;
        info!(account_id = %identity.account_id, "logged in");
        Ok(identity)
    }

    /// Re-registers this device for the stored account, refreshing the
    /// cached identity. Fails with [`AccountError::NotFound`] when the
    /// server no longer knows the account.
    pub async fn refresh_registration(&self) -> AccountResult<AccountIdentity> {
        let account_id = self.account_id().await.ok_or(AccountError::NotFound)?;
        let identity = self.register_remote(&account_id).await?;
        *self.identity.write().await = Some(identity.clone());
        Ok(identity)
    }

    /// Silently restores a previously persisted identity at launch.
    ///
    /// A stored id that fails format validation is cleared. A transient
    /// network failure keeps the stale local value: the id is only ever
    /// cleared by explicit logout/delete or by a format failure here.
    pub async fn restore_at_launch(&self) -> AccountResult<Option<AccountIdentity>> {
        let Some(stored) = self.account_id().await else {
            return Ok(None);
        };
        if !AccountId::is_canonical(stored.as_str()) {
            warn!(account_id = %stored, "stored account id fails validation, clearing");
            self.store.write().await.clear_identity()?;
            return Ok(None);
        }
        match self.register_remote(&stored).await {
            Ok(identity) => {
                *self.identity.write().await = Some(identity.clone());
                Ok(Some(identity))
            }
            Err(AccountError::ConfigurationMissing) => Ok(None),
            Err(e) => {
                // Keep the stale value; a later refresh will reconcile.
                warn!(account_id = %stored, error = %e, "launch registration failed, keeping stored id");
                Ok(None)
            }
        }
    }

    /// Deletes the account. Only permitted while the tier is free.
    pub async fn delete_identity(&self) -> AccountResult<()> {
        let Some(account_id) = self.account_id().await else {
            return Ok(());
        };
        let tier = match self.identity().await {
            Some(identity) => identity.tier,
            None => self.refresh_registration().await?.tier,
        };
        if tier != SubscriptionTier::Free {
            return Err(AccountError::PaidTier);
        }
        self.directory.delete_account(&account_id).await?;
        self.clear_local().await?;
        info!(%account_id, "deleted account");
        Ok(())
    }

    /// Logs out, clearing local identity state. The old id is kept as the
    /// login-form prefill so the user can get back in.
    pub async fn logout(&self) -> AccountResult<()> {
        let old = self.account_id().await;
        self.clear_local().await?;
        if let Some(id) = old {
            self.store
                .write()
                .await
                .set_prefill_id(Some(id.as_str().to_string()))?;
        }
        Ok(())
    }

    /// Links a recovery contact to the current account.
    pub async fn link_contact(&self, method: ContactMethod, value: &str) -> AccountResult<()> {
        let account_id = self.account_id().await.ok_or(AccountError::NotFound)?;
        self.directory.link_contact(&account_id, method, value).await?;
        if let Some(identity) = self.identity.write().await.as_mut() {
            identity.contact_method = Some(method);
            identity.contact_value = Some(value.to_string());
        }
        Ok(())
    }

    /// Lists devices bound to the current account.
    pub async fn list_devices(&self) -> AccountResult<Vec<DeviceBinding>> {
        let account_id = self.account_id().await.ok_or(AccountError::NotFound)?;
        self.directory.get_account_devices(&account_id).await
    }

    /// Revokes a device binding. Callers enforce any policy about removing
    /// the currently active device.
    pub async fn remove_device(&self, device_id: &str) -> AccountResult<()> {
        let account_id = self.account_id().await.ok_or(AccountError::NotFound)?;
        self.directory.remove_device(&account_id, device_id).await
    }

    /// Returns whether onboarding has completed.
    pub async fn onboarding_complete(&self) -> bool {
        self.store.read().await.onboarding_complete()
    }

    /// Persists the onboarding flag.
    pub async fn set_onboarding_complete(&self, complete: bool) -> AccountResult<()> {
        self.store.write().await.set_onboarding_complete(complete)
    }

    /// Returns the login-form prefill id, if any.
    pub async fn prefill_id(&self) -> Option<String> {
        self.store.read().await.prefill_id().map(str::to_string)
    }

    async fn register_remote(&self, account_id: &AccountId) -> AccountResult<AccountIdentity> {
        let device_id = self.device_id().await?;
        debug!(%account_id, %device_id, "registering device with directory");
        self.directory
            .register_device(account_id, &device_id, &self.device_name, self.device_type)
            .await
    }

    async fn persist_identity(&self, identity: AccountIdentity) -> AccountResult<()> {
        let mut store = self.store.write().await;
        store.set_account_id(Some(identity.account_id.clone()))?;
        store.set_prefill_id(None)?;
        drop(store);
        *self.identity.write().await = Some(identity);
        Ok(())
    }

    async fn clear_local(&self) -> AccountResult<()> {
        self.store.write().await.clear_identity()?;
        *self.identity.write().await = None;
        Ok(())
    }
}
