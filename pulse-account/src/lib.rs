//! Account identity layer for Pulse.
//!
//! This crate handles:
//! - The durable local identity (account id, onboarding flag, prefill id,
//!   per-install device id)
//! - The account directory RPC client (create, register, delete, contact
//!   linking, device enumeration)
//! - Launch restoration of a previously persisted identity
//!
//! The canonical account id string is the account's sole credential.
//! Transport faults are fatal for identity-mutating calls; launch
//! restoration alone fails open and keeps the stale local value.

mod directory;
mod error;
mod manager;
mod store;

pub use directory::AccountDirectory;
pub use error::{AccountError, AccountResult};
pub use manager::AccountManager;
pub use store::AccountStore;
