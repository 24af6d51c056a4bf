//! Ownership ledger RPC client.
//!
//! The ledger is the backend's authoritative mapping of purchase
//! transaction → owning account. `claim` is the write path (locks a
//! transaction to an account or reports the existing owner);
//! `verify_restore` is a read-only pre-check that lets the UI surface an
//! ownership conflict before any write occurs.

use crate::error::{OwnershipError, OwnershipResult};
use chrono::{DateTime, SecondsFormat, Utc};
use pulse_types::{AccountId, ApiConfig, StoreKind, SubscriptionTier};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// The server's verdict on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimAction {
    /// First claim: the transaction is now locked to the account.
    Claimed,
    /// Same account re-claimed; server fields were refreshed.
    Updated,
    /// A different account already owns the transaction.
    Rejected,
    /// Anything a newer backend reports that this build does not know.
    /// Callers must treat this as an error, never as success.
    #[serde(other)]
    Unknown,
}

/// Response to `claim_subscription`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub action: ClaimAction,
    /// The owning account when the claim was rejected.
    pub owner: Option<AccountId>,
}

/// Response to `verify_restore`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRestoreResponse {
    /// Whether a claim by this account would be accepted.
    pub allowed: bool,
    /// The current owner when not allowed, if the server knows it.
    pub owner: Option<AccountId>,
    /// Human-readable reason, when provided.
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClaimParams<'a> {
    p_account_id: &'a str,
    p_tier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    p_expires_at: Option<String>,
    p_original_transaction_id: &'a str,
    p_store: &'a str,
    p_product_id: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyParams<'a> {
    p_account_id: &'a str,
    p_original_transaction_id: &'a str,
}

/// Client for the ownership ledger RPCs.
#[derive(Debug, Clone)]
pub struct OwnershipLedger {
    config: ApiConfig,
    client: Client,
}

impl OwnershipLedger {
    /// Creates a ledger client for the given endpoint.
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        Self { config, client }
    }

    /// Claims a purchase transaction for an account.
    pub async fn claim(
        &self,
        account_id: &AccountId,
        tier: SubscriptionTier,
        expires_at: Option<DateTime<Utc>>,
        transaction_id: &str,
        store: StoreKind,
        product_id: &str,
    ) -> OwnershipResult<ClaimResponse> {
        debug!(%account_id, transaction_id, %tier, "claiming subscription");
        self.call(
            "claim_subscription",
            &ClaimParams {
                p_account_id: account_id.as_str(),
                p_tier: tier.as_str(),
                p_expires_at: expires_at.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
                p_original_transaction_id: transaction_id,
                p_store: store.as_str(),
                p_product_id: product_id,
            },
        )
        .await
    }

    /// Read-only check whether a claim by `account_id` would be accepted.
    ///
    /// Takes the id as a plain string so a pre-account user can probe with
    /// a sentinel id during onboarding.
    pub async fn verify_restore(
        &self,
        account_id: &str,
        transaction_id: &str,
    ) -> OwnershipResult<VerifyRestoreResponse> {
        debug!(account_id, transaction_id, "verifying restore");
        self.call(
            "verify_restore",
            &VerifyParams {
                p_account_id: account_id,
                p_original_transaction_id: transaction_id,
            },
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        body: &impl Serialize,
    ) -> OwnershipResult<T> {
        if !self.config.is_configured() {
            return Err(OwnershipError::ConfigurationMissing);
        }
        let response = self
            .client
            .post(self.config.rpc_url(function))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OwnershipError::Timeout
                } else {
                    OwnershipError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OwnershipError::Server { status: status.as_u16(), message });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| OwnershipError::Decoding(e.to_string()))
    }
}
