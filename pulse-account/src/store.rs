//! Durable local account state.
//!
//! A single small JSON document holding the last-known account id, the
//! onboarding flag, an optional prefill id for the login form, and the
//! stable per-install device id. Writes go through a temp file + rename so
//! a crash mid-write never corrupts the stored credential.

use crate::error::{AccountError, AccountResult};
use pulse_types::AccountId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// The persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalAccountState {
    account_id: Option<AccountId>,
    #[serde(default)]
    onboarding_complete: bool,
    prefill_id: Option<String>,
    device_id: Option<String>,
}

/// File-backed store for the local account identity.
#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    state: LocalAccountState,
}

impl AccountStore {
    /// Opens the store at `path`, loading existing state if present.
    ///
    /// A malformed document is discarded and replaced with defaults; the
    /// credential cannot be recovered from a corrupt file anyway.
    pub fn open(path: impl Into<PathBuf>) -> AccountResult<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding malformed account state");
                    LocalAccountState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalAccountState::default(),
            Err(e) => return Err(AccountError::Storage(e.to_string())),
        };
        Ok(Self { path, state })
    }

    /// Returns the default store location under the platform data dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("Pulse").join("account.json"))
    }

    /// Returns the stored account id, if any.
    #[must_use]
    pub fn account_id(&self) -> Option<&AccountId> {
        self.state.account_id.as_ref()
    }

    /// Persists a new account id (or clears it with `None`).
    pub fn set_account_id(&mut self, id: Option<AccountId>) -> AccountResult<()> {
        self.state.account_id = id;
        self.save()
    }

    /// Returns whether onboarding has completed.
    #[must_use]
    pub fn onboarding_complete(&self) -> bool {
        self.state.onboarding_complete
    }

    /// Persists the onboarding flag.
    pub fn set_onboarding_complete(&mut self, complete: bool) -> AccountResult<()> {
        self.state.onboarding_complete = complete;
        self.save()
    }

    /// Returns the prefill id shown in the login form, if any.
    #[must_use]
    pub fn prefill_id(&self) -> Option<&str> {
        self.state.prefill_id.as_deref()
    }

    /// Persists the prefill id (or clears it with `None`).
    pub fn set_prefill_id(&mut self, id: Option<String>) -> AccountResult<()> {
        self.state.prefill_id = id;
        self.save()
    }

    /// Returns the stable per-install device id, generating and persisting
    /// one on first use.
    pub fn device_id(&mut self) -> AccountResult<String> {
        if let Some(id) = &self.state.device_id {
            return Ok(id.clone());
        }
        let id = Uuid::new_v4().to_string();
        self.state.device_id = Some(id.clone());
        self.save()?;
        Ok(id)
    }

    /// Clears the identity-bearing fields. The device id survives: it
    /// identifies the install, not the account.
    pub fn clear_identity(&mut self) -> AccountResult<()> {
        self.state.account_id = None;
        self.state.onboarding_complete = false;
        self.state.prefill_id = None;
        self.save()
    }

    fn save(&self) -> AccountResult<()> {
        write_json_atomic(&self.path, &self.state)
    }
}

/// Serializes `value` to `path` via a temp file + rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AccountResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AccountError::Storage(e.to_string()))?;
    }
    let json =
        serde_json::to_vec_pretty(value).map_err(|e| AccountError::Storage(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).map_err(|e| AccountError::Storage(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| AccountError::Storage(e.to_string()))?;
    Ok(())
}
