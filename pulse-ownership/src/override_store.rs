//! Persisted ownership override.
//!
//! When the server rejects this account's claim, the effective tier is
//! forced to free even while the platform billing cache still reports an
//! active subscription. The user may force-quit between receiving the
//! rejection and acting on it, so the override is durable and must be
//! loaded before any tier-gated decision renders.

use crate::error::{OwnershipError, OwnershipResult};
use pulse_types::AccountId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The override state. One tagged variant: the invalid combination of
/// "not rejected, but an owner is recorded" is unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum OwnershipOverride {
    /// No override; the billing entitlement stands.
    #[default]
    Clear,
    /// The server rejected this account's claim. Forces the free tier.
    Rejected {
        /// The owning account, when the server disclosed it. `None` is a
        /// valid terminal state that routes to manual support.
        owner: Option<AccountId>,
    },
}

impl OwnershipOverride {
    /// Returns true when a rejection is in force.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns the recorded owner, when known.
    #[must_use]
    pub fn owner(&self) -> Option<&AccountId> {
        match self {
            Self::Clear => None,
            Self::Rejected { owner } => owner.as_ref(),
        }
    }
}

/// File-backed store for the ownership override.
#[derive(Debug)]
pub struct OverrideStore {
    path: PathBuf,
    current: OwnershipOverride,
}

impl OverrideStore {
    /// Opens the store at `path`, loading a persisted override if present.
    /// A malformed document is treated as `Clear`.
    pub fn open(path: impl Into<PathBuf>) -> OwnershipResult<Self> {
        let path = path.into();
        let current = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "discarding malformed override state");
                    OwnershipOverride::Clear
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => OwnershipOverride::Clear,
            Err(e) => return Err(OwnershipError::Storage(e.to_string())),
        };
        Ok(Self { path, current })
    }

    /// Returns the default store location under the platform data dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("Pulse").join("ownership.json"))
    }

    /// Returns the current override.
    #[must_use]
    pub fn get(&self) -> &OwnershipOverride {
        &self.current
    }

    /// Records a rejection. Persists before returning.
    pub fn mark_rejected(&mut self, owner: Option<AccountId>) -> OwnershipResult<()> {
        info!(owner = ?owner.as_ref().map(AccountId::as_str), "ownership claim rejected, forcing free tier");
        self.current = OwnershipOverride::Rejected { owner };
        self.save()
    }

    /// Clears the override. Persists before returning.
    pub fn clear(&mut self) -> OwnershipResult<()> {
        if self.current.is_rejected() {
            info!("clearing ownership override");
        }
        self.current = OwnershipOverride::Clear;
        self.save()
    }

    fn save(&self) -> OwnershipResult<()> {
        write_json_atomic(&self.path, &self.current)
    }
}

/// Serializes `value` to `path` via a temp file + rename.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> OwnershipResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| OwnershipError::Storage(e.to_string()))?;
    }
    let json =
        serde_json::to_vec_pretty(value).map_err(|e| OwnershipError::Storage(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json).map_err(|e| OwnershipError::Storage(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| OwnershipError::Storage(e.to_string()))?;
    Ok(())
}
