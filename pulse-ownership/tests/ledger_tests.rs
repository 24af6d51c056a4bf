mod common;

use common::api_config;
use pulse_ownership::{ClaimAction, OwnershipError, OwnershipLedger};
use pulse_types::{AccountId, ApiConfig, StoreKind, SubscriptionTier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account() -> AccountId {
    AccountId::parse("VPN-ABCD-1234-EFGH").unwrap()
}

#[tokio::test]
async fn claim_sends_contract_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/claim_subscription"))
        .and(body_partial_json(json!({
            "p_account_id": "VPN-ABCD-1234-EFGH",
            "p_tier": "premium",
            "p_original_transaction_id": "pulse_premium_yearly_2024-03-01T12:30:00Z",
            "p_store": "app_store",
            "p_product_id": "pulse_premium_yearly"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "action": "claimed"
        })))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let snapshot = common::premium_entitlement();
    let response = ledger
        .claim(
            &account(),
            snapshot.tier,
            snapshot.expires_at,
            &snapshot.original_transaction_id(),
            snapshot.store,
            &snapshot.product_id,
        )
        .await
        .unwrap();
    assert_eq!(response.action, ClaimAction::Claimed);
    assert!(response.owner.is_none());
}

#[tokio::test]
async fn claim_rejected_carries_owner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/claim_subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "action": "rejected",
            "owner": "VPN-1111-2222-3333"
        })))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let snapshot = common::premium_entitlement();
    let response = ledger
        .claim(
            &account(),
            SubscriptionTier::Premium,
            snapshot.expires_at,
            "tx-1",
            StoreKind::AppStore,
            "pulse_premium_yearly",
        )
        .await
        .unwrap();
    assert_eq!(response.action, ClaimAction::Rejected);
    assert_eq!(response.owner.unwrap().as_str(), "VPN-1111-2222-3333");
}

#[tokio::test]
async fn unknown_claim_action_decodes_to_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/claim_subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "action": "transmogrified"
        })))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let response = ledger
        .claim(
            &account(),
            SubscriptionTier::Pro,
            None,
            "tx-1",
            StoreKind::AppStore,
            "pulse_pro_monthly",
        )
        .await
        .unwrap();
    assert_eq!(response.action, ClaimAction::Unknown);
}

#[tokio::test]
async fn verify_restore_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/verify_restore"))
        .and(body_partial_json(json!({
            "p_account_id": "VPN-ABCD-1234-EFGH",
            "p_original_transaction_id": "tx-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "allowed": true })))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let verdict = ledger
        .verify_restore("VPN-ABCD-1234-EFGH", "tx-1")
        .await
        .unwrap();
    assert!(verdict.allowed);
    assert!(verdict.owner.is_none());
}

#[tokio::test]
async fn verify_restore_accepts_sentinel_account_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/verify_restore"))
        .and(body_partial_json(json!({ "p_account_id": "VPN-0000-0000-0000" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": false,
            "owner": "VPN-9999-8888-7777",
            "reason": "transaction already claimed"
        })))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let verdict = ledger
        .verify_restore("VPN-0000-0000-0000", "tx-1")
        .await
        .unwrap();
    assert!(!verdict.allowed);
    assert_eq!(verdict.owner.unwrap().as_str(), "VPN-9999-8888-7777");
    assert_eq!(verdict.reason.as_deref(), Some("transaction already claimed"));
}

#[tokio::test]
async fn http_failure_maps_to_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc/verify_restore"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ledger = OwnershipLedger::new(api_config(&server.uri()));
    let result = ledger.verify_restore("VPN-ABCD-1234-EFGH", "tx-1").await;
    assert!(matches!(result, Err(OwnershipError::Server { status: 500, .. })));
}

#[tokio::test]
async fn unconfigured_endpoint_disables_calls() {
    let ledger = OwnershipLedger::new(ApiConfig::default());
    let result = ledger.verify_restore("VPN-ABCD-1234-EFGH", "tx-1").await;
    assert!(matches!(result, Err(OwnershipError::ConfigurationMissing)));
}
