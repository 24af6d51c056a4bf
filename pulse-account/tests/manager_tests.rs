mod common;

use common::{api_config, register_success};
use pulse_account::{AccountError, AccountManager, AccountStore};
use pulse_types::ContactMethod;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server_uri: &str, dir: &TempDir) -> AccountManager {
    let store = AccountStore::open(dir.path().join("account.json")).unwrap();
    AccountManager::new(api_config(server_uri), store, "Test Device")
}

async fn mount_register(server: &MockServer, account_id: &str, tier: &str) {
    Mock::given(method("POST"))
        .and(path("/rpc/register_device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(register_success(account_id, tier)))
        .mount(server)
        .await;
}

// ── create_identity ─────────────────────────────────────────────

#[tokio::test]
async fn create_identity_persists_after_both_calls_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/create_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account_id": "VPN-AAAA-BBBB-CCCC"
        })))
        .mount(&server)
        .await;
    mount_register(&server, "VPN-AAAA-BBBB-CCCC", "free").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    let identity = manager.create_identity().await.unwrap();
    assert_eq!(identity.account_id.as_str(), "VPN-AAAA-BBBB-CCCC");
    assert_eq!(
        manager.account_id().await.unwrap().as_str(),
        "VPN-AAAA-BBBB-CCCC"
    );
}

#[tokio::test]
async fn create_identity_is_all_or_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/create_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account_id": "VPN-AAAA-BBBB-CCCC"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc/register_device"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    assert!(manager.create_identity().await.is_err());
    // Registration failed, so no local identity was persisted.
    assert!(manager.account_id().await.is_none());
    assert!(manager.identity().await.is_none());
}

// ── login ───────────────────────────────────────────────────────

#[tokio::test]
async fn login_normalizes_and_persists() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "premium").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    let identity = manager.login("vpnabcd1234efgh5678").await.unwrap();
    assert_eq!(identity.account_id.as_str(), "VPN-ABCD-1234-EFGH");
    assert_eq!(identity.tier, pulse_types::SubscriptionTier::Premium);
}

#[tokio::test]
async fn login_rejects_invalid_format_without_network() {
    // No mocks mounted: a network call would 404 and fail differently.
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    let result = manager.login("abc").await;
    assert!(matches!(result, Err(AccountError::InvalidFormat(_))));
    assert!(manager.account_id().await.is_none());
}

#[tokio::test]
async fn login_failure_does_not_persist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/register_device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error_code": "not_found",
            "error": "no such account"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    assert!(matches!(
        manager.login("vpn111122223333").await,
        Err(AccountError::NotFound)
    ));
    assert!(manager.account_id().await.is_none());
}

// ── launch restoration ──────────────────────────────────────────

#[tokio::test]
async fn restore_at_launch_refreshes_identity() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "pro").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();

    // Simulate a fresh process over the same store.
    let manager = self::manager(&server.uri(), &dir);
    let identity = manager.restore_at_launch().await.unwrap().unwrap();
    assert_eq!(identity.account_id.as_str(), "VPN-ABCD-1234-EFGH");
}

#[tokio::test]
async fn restore_at_launch_keeps_stale_id_on_transient_failure() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "pro").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();

    // Next launch: backend is down.
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/rpc/register_device"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let manager = self::manager(&server.uri(), &dir);
    let identity = manager.restore_at_launch().await.unwrap();
    assert!(identity.is_none());
    // The stored credential survives the failed probe.
    assert_eq!(
        manager.account_id().await.unwrap().as_str(),
        "VPN-ABCD-1234-EFGH"
    );
}

#[tokio::test]
async fn restore_at_launch_clears_malformed_stored_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("account.json");
    std::fs::write(
        &path,
        serde_json::to_vec(&json!({
            "account_id": "garbage-id",
            "onboarding_complete": true,
            "prefill_id": null,
            "device_id": "d-1"
        }))
        .unwrap(),
    )
    .unwrap();

    let server = MockServer::start().await;
    let store = AccountStore::open(&path).unwrap();
    let manager = AccountManager::new(api_config(&server.uri()), store, "Test Device");
    let identity = manager.restore_at_launch().await.unwrap();
    assert!(identity.is_none());
    assert!(manager.account_id().await.is_none());
}

// ── delete ──────────────────────────────────────────────────────

#[tokio::test]
async fn delete_identity_requires_free_tier() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "premium").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();

    assert!(matches!(
        manager.delete_identity().await,
        Err(AccountError::PaidTier)
    ));
    // Nothing was cleared.
    assert!(manager.account_id().await.is_some());
}

#[tokio::test]
async fn delete_identity_clears_local_state() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "free").await;
    Mock::given(method("POST"))
        .and(path("/rpc/delete_account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();
    manager.delete_identity().await.unwrap();
    assert!(manager.account_id().await.is_none());
    assert!(manager.identity().await.is_none());
}

// ── logout / contact ────────────────────────────────────────────

#[tokio::test]
async fn logout_keeps_prefill_id() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "free").await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();
    manager.logout().await.unwrap();

    assert!(manager.account_id().await.is_none());
    assert_eq!(
        manager.prefill_id().await.as_deref(),
        Some("VPN-ABCD-1234-EFGH")
    );
}

#[tokio::test]
async fn link_contact_updates_cached_identity() {
    let server = MockServer::start().await;
    mount_register(&server, "VPN-ABCD-1234-EFGH", "free").await;
    Mock::given(method("POST"))
        .and(path("/rpc/link_contact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let manager = manager(&server.uri(), &dir);
    manager.login("vpn-abcd-1234-efgh").await.unwrap();
    manager
        .link_contact(ContactMethod::Email, "user@example.com")
        .await
        .unwrap();

    let identity = manager.identity().await.unwrap();
    assert_eq!(identity.contact_method, Some(ContactMethod::Email));
    assert_eq!(identity.contact_value.as_deref(), Some("user@example.com"));
}
