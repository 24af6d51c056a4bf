//! Device bindings.
//!
//! An account owns up to `max_devices` device bindings. Each binding is
//! keyed by a stable per-install device id generated by the account layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The broad device class reported at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ios,
    Android,
    Macos,
    Windows,
    Linux,
    /// Anything a newer client reports that this build does not know.
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    /// Returns the device type for the current build target.
    #[must_use]
    pub fn current() -> Self {
        match std::env::consts::OS {
            "ios" => Self::Ios,
            "android" => Self::Android,
            "macos" => Self::Macos,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            _ => Self::Unknown,
        }
    }
}

/// A device registered against an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    /// Server record id.
    pub id: Uuid,
    /// Stable per-install device id.
    pub device_id: String,
    /// Human-readable device name.
    pub device_name: String,
    /// Device class.
    pub device_type: DeviceType,
    /// Whether this is the account's main device.
    pub is_main: bool,
    /// Last time this device checked in.
    pub last_active_at: Option<DateTime<Utc>>,
    /// When the binding was created.
    pub created_at: DateTime<Utc>,
}
