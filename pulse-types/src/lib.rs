//! Core type definitions for the Pulse account and ownership layer.
//!
//! This crate defines the vocabulary shared by the account directory client
//! and the ownership/sync layer:
//! - The canonical account id (the account's sole credential)
//! - Subscription tiers
//! - Device bindings
//! - Entitlement snapshots from the billing collaborator
//! - Backend endpoint configuration
//!
//! Presentation concerns and collaborator mechanics (billing SDK, tunnel,
//! backend implementation) live elsewhere; nothing here performs I/O.

mod account_id;
mod config;
mod device;
mod entitlement;
mod identity;
mod tier;

pub use account_id::{AccountId, AccountIdError, ACCOUNT_ID_PREFIX};
pub use config::ApiConfig;
pub use device::{DeviceBinding, DeviceType};
pub use entitlement::{EntitlementSnapshot, StoreKind};
pub use identity::{AccountIdentity, ContactMethod};
pub use tier::SubscriptionTier;
