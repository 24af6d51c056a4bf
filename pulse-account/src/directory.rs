//! Account directory RPC client.
//!
//! JSON over authenticated HTTPS POST. Every call carries the configured
//! API key and an explicit timeout; a hung backend resolves to
//! [`AccountError::Timeout`] rather than blocking the caller.

use crate::error::{AccountError, AccountResult};
use chrono::{DateTime, Utc};
use pulse_types::{
    AccountId, AccountIdentity, ApiConfig, ContactMethod, DeviceBinding, DeviceType,
    SubscriptionTier,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Client for the account directory RPCs.
#[derive(Debug, Clone)]
pub struct AccountDirectory {
    config: ApiConfig,
    client: Client,
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateAccountResponse {
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    error: Option<String>,
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterDeviceResponse {
    success: bool,
    error: Option<String>,
    error_code: Option<String>,
    account: Option<AccountRecord>,
}

#[derive(Debug, Deserialize)]
struct AccountRecord {
    id: Uuid,
    account_id: String,
    subscription_tier: String,
    max_devices: u32,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    contact_method: Option<String>,
    contact_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    success: bool,
    error: Option<String>,
    error_code: Option<String>,
    #[serde(default)]
    devices: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    id: Uuid,
    device_id: String,
    device_name: String,
    device_type: DeviceType,
    is_main: bool,
    last_active_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RegisterDeviceParams<'a> {
    p_account_id: &'a str,
    p_device_id: &'a str,
    p_device_name: &'a str,
    p_device_type: DeviceType,
}

#[derive(Debug, Serialize)]
struct AccountParams<'a> {
    p_account_id: &'a str,
}

#[derive(Debug, Serialize)]
struct LinkContactParams<'a> {
    p_account_id: &'a str,
    p_contact_method: &'a str,
    p_contact_value: &'a str,
}

#[derive(Debug, Serialize)]
struct RemoveDeviceParams<'a> {
    p_account_id: &'a str,
    p_device_id: &'a str,
}

impl AccountRecord {
    fn into_identity(self) -> AccountResult<AccountIdentity> {
        let account_id = AccountId::parse(&self.account_id)
            .map_err(|_| AccountError::Decoding(format!("bad account id: {}", self.account_id)))?;
        let tier: SubscriptionTier = self.subscription_tier.parse().unwrap_or_default();
        let contact_method = match self.contact_method.as_deref() {
            Some("email") => Some(ContactMethod::Email),
            Some("telegram") => Some(ContactMethod::Telegram),
            _ => None,
        };
        Ok(AccountIdentity {
            account_id,
            record_id: self.id,
            tier,
            max_devices: self.max_devices,
            contact_method,
            contact_value: self.contact_value,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<DeviceRecord> for DeviceBinding {
    fn from(r: DeviceRecord) -> Self {
        Self {
            id: r.id,
            device_id: r.device_id,
            device_name: r.device_name,
            device_type: r.device_type,
            is_main: r.is_main,
            last_active_at: r.last_active_at,
            created_at: r.created_at,
        }
    }
}

// ── Client ──────────────────────────────────────────────────────

impl AccountDirectory {
    /// Creates a directory client for the given endpoint.
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        Self { config, client }
    }

    /// Creates a new account. The server mints the canonical id.
    pub async fn create_account(&self) -> AccountResult<AccountId> {
        let resp: CreateAccountResponse = self.call("create_account", &serde_json::json!({})).await?;
        AccountId::parse(&resp.account_id)
            .map_err(|_| AccountError::Decoding(format!("bad account id: {}", resp.account_id)))
    }

    /// Registers (or re-registers) a device against an account and returns
    /// the refreshed identity. Idempotent per `device_id`.
    pub async fn register_device(
        &self,
        account_id: &AccountId,
        device_id: &str,
        device_name: &str,
        device_type: DeviceType,
    ) -> AccountResult<AccountIdentity> {
        debug!(%account_id, device_id, "registering device");
        let resp: RegisterDeviceResponse = self
            .call(
                "register_device",
                &RegisterDeviceParams {
                    p_account_id: account_id.as_str(),
                    p_device_id: device_id,
                    p_device_name: device_name,
                    p_device_type: device_type,
                },
            )
            .await?;
        if !resp.success {
            return Err(map_rpc_error(resp.error_code.as_deref(), resp.error.as_deref()));
        }
        resp.account
            .ok_or_else(|| AccountError::Decoding("register_device: missing account".to_string()))?
            .into_identity()
    }

    /// Deletes an account. The server refuses paid tiers; the manager
    /// checks the same precondition before calling.
    pub async fn delete_account(&self, account_id: &AccountId) -> AccountResult<()> {
        let resp: StatusResponse = self
            .call("delete_account", &AccountParams { p_account_id: account_id.as_str() })
            .await?;
        self.check_status(resp)
    }

    /// Links a recovery contact to an account.
    pub async fn link_contact(
        &self,
        account_id: &AccountId,
        method: ContactMethod,
        value: &str,
    ) -> AccountResult<()> {
        let resp: StatusResponse = self
            .call(
                "link_contact",
                &LinkContactParams {
                    p_account_id: account_id.as_str(),
                    p_contact_method: method.as_str(),
                    p_contact_value: value,
                },
            )
            .await?;
        self.check_status(resp)
    }

    /// Lists the devices bound to an account.
    pub async fn get_account_devices(
        &self,
        account_id: &AccountId,
    ) -> AccountResult<Vec<DeviceBinding>> {
        let resp: DevicesResponse = self
            .call(
                "get_account_devices",
                &AccountParams { p_account_id: account_id.as_str() },
            )
            .await?;
        if !resp.success {
            return Err(map_rpc_error(resp.error_code.as_deref(), resp.error.as_deref()));
        }
        Ok(resp.devices.into_iter().map(DeviceBinding::from).collect())
    }

    /// Revokes a device binding. Removing the currently active device is
    /// the caller's policy; the directory does not special-case it.
    pub async fn remove_device(&self, account_id: &AccountId, device_id: &str) -> AccountResult<()> {
        let resp: StatusResponse = self
            .call(
                "remove_device",
                &RemoveDeviceParams {
                    p_account_id: account_id.as_str(),
                    p_device_id: device_id,
                },
            )
            .await?;
        self.check_status(resp)
    }

    fn check_status(&self, resp: StatusResponse) -> AccountResult<()> {
        if resp.success {
            Ok(())
        } else {
            Err(map_rpc_error(resp.error_code.as_deref(), resp.error.as_deref()))
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        body: &impl Serialize,
    ) -> AccountResult<T> {
        if !self.config.is_configured() {
            return Err(AccountError::ConfigurationMissing);
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
                    AccountError::Timeout
                } else {
                    AccountError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AccountError::Server { status: status.as_u16(), message });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AccountError::Decoding(e.to_string()))
    }
}

/// Maps an RPC error envelope to a typed error.
///
/// Prefers the structured `error_code` when the backend sends one; the
/// substring match on the error text is a compatibility shim for backends
/// that only report a message.
fn map_rpc_error(error_code: Option<&str>, error: Option<&str>) -> AccountError {
    let message = error.unwrap_or("unknown server error");
    match error_code {
        Some("not_found") => AccountError::NotFound,
        Some(_) => AccountError::Server { status: 200, message: message.to_string() },
        None if message.to_ascii_lowercase().contains("not found") => AccountError::NotFound,
        None => AccountError::Server { status: 200, message: message.to_string() },
    }
}
