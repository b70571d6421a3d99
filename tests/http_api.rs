//! End-to-end tests driving the full router against the in-memory store.
//!
//! Requests are signed with real secp256k1 keys over server-issued
//! challenges, exactly as a wallet client would.

#![allow(clippy::panic)]

use std::net::SocketAddr;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use k256::ecdsa::SigningKey;
use serde_json::{Value, json};
use tower::ServiceExt;

use wallet_tracker_gateway::api::build_app;
use wallet_tracker_gateway::app_state::AppState;
use wallet_tracker_gateway::auth::WalletAuthenticator;
use wallet_tracker_gateway::auth::signature::{address_of, personal_message_hash};
use wallet_tracker_gateway::config::GatewayConfig;
use wallet_tracker_gateway::persistence::Store;

struct Wallet {
    key: SigningKey,
    address: String,
}

impl Wallet {
    fn new(byte: u8) -> Self {
        let Ok(key) = SigningKey::from_slice(&[byte; 32]) else {
            panic!("valid private key");
        };
        let address = address_of(key.verifying_key()).to_string();
        Self { key, address }
    }

    fn sign(&self, message: &str) -> String {
        let Ok((signature, recovery_id)) =
            self.key.sign_prehash_recoverable(&personal_message_hash(message))
        else {
            panic!("signing failed");
        };
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());
        format!("0x{}", hex::encode(bytes))
    }
}

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn app_with(config: GatewayConfig) -> Router {
    let state = AppState::new(
        Store::in_memory(),
        WalletAuthenticator::new(config.auth_policy()),
        "https://app.example",
    );
    build_app(state, &config)
}

fn app() -> Router {
    app_with(GatewayConfig::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "http-api-test");
    let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
    let Ok(mut request) = builder.body(body) else {
        panic!("request build failed");
    };
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000))));

    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let headers = response.headers().clone();
    let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        let Ok(value) = serde_json::from_slice(&bytes) else {
            panic!("body is not json: {bytes:?}");
        };
        value
    };
    Response {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

/// Fetches a challenge for `wallet` and returns `fields` plus valid
/// credentials.
async fn signed(app: &Router, wallet: &Wallet, mut fields: Value) -> Value {
    let challenge = get(app, &format!("/api/auth/challenge/{}", wallet.address)).await;
    assert_eq!(challenge.status, StatusCode::OK);
    let Some(message) = challenge.body["data"]["message"].as_str() else {
        panic!("challenge without message: {}", challenge.body);
    };
    fields["walletAddress"] = json!(wallet.address);
    fields["message"] = json!(message);
    fields["signature"] = json!(wallet.sign(message));
    fields
}

async fn post_signed(app: &Router, uri: &str, wallet: &Wallet, fields: Value) -> Response {
    let body = signed(app, wallet, fields).await;
    send(app, Method::POST, uri, Some(body)).await
}

#[tokio::test]
async fn health_reports_ok_with_security_headers() {
    let app = app();
    let response = get(&app, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["version"].is_string());
    assert_eq!(
        response.headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert!(response.headers.get("strict-transport-security").is_some());
    assert!(response.headers.get("ratelimit-limit").is_none());
}

#[tokio::test]
async fn track_click_is_idempotent_over_http() {
    let app = app();
    let alice = Wallet::new(1);
    let target = Wallet::new(2);

    let first = post_signed(
        &app,
        "/api/tracking/click",
        &alice,
        json!({ "trackedAddress": target.address }),
    )
    .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["success"], true);
    assert_eq!(first.body["message"], "Wallet track click recorded successfully");

    let upper = format!("0x{}", target.address.trim_start_matches("0x").to_uppercase());
    let second =
        post_signed(&app, "/api/tracking/click", &alice, json!({ "trackedAddress": upper })).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["message"], "Wallet already tracked");
    assert_eq!(second.body["data"]["trackingId"], first.body["data"]["trackingId"]);

    let stats = get(&app, &format!("/api/tracking/stats/{}", alice.address)).await;
    assert_eq!(stats.body["data"]["trackCount"], 1);
}

#[tokio::test]
async fn inputs_accumulate_in_stats() {
    let app = app();
    let alice = Wallet::new(3);
    for target in [Wallet::new(4), Wallet::new(5), Wallet::new(4)] {
        let response = post_signed(
            &app,
            "/api/tracking/input",
            &alice,
            json!({ "trackedAddress": target.address, "metadata": { "chainId": "0x1" } }),
        )
        .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["message"], "Wallet input tracked successfully");
        assert!(response.body["data"]["trackingId"].is_string());
    }

    let stats = get(&app, &format!("/api/tracking/stats/{}", alice.address)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(
        stats.body["data"],
        json!({ "inputCount": 3, "trackCount": 0, "uniqueWalletsTracked": 2 })
    );
}

#[tokio::test]
async fn missing_tracked_address_is_rejected() {
    let app = app();
    let alice = Wallet::new(6);
    let response = post_signed(&app, "/api/tracking/input", &alice, json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "missing_field");
}

#[tokio::test]
async fn missing_credentials_are_rejected() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/api/tracking/click",
        Some(json!({ "trackedAddress": Wallet::new(2).address })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "missing_parameters");
}

#[tokio::test]
async fn signature_from_another_key_is_rejected() {
    let app = app();
    let alice = Wallet::new(7);
    let mallory = Wallet::new(8);

    let mut body = signed(&app, &alice, json!({ "trackedAddress": mallory.address })).await;
    let Some(message) = body["message"].as_str().map(str::to_string) else {
        panic!("message missing");
    };
    body["signature"] = json!(mallory.sign(&message));

    let response = send(&app, Method::POST, "/api/tracking/click", Some(body)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "signature_mismatch");
}

#[tokio::test]
async fn replayed_challenge_is_rejected() {
    let app = app();
    let alice = Wallet::new(9);
    let body = signed(&app, &alice, json!({ "trackedAddress": Wallet::new(1).address })).await;

    let first = send(&app, Method::POST, "/api/tracking/input", Some(body.clone())).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let replay = send(&app, Method::POST, "/api/tracking/input", Some(body)).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.body["error"], "invalid_challenge");
}

#[tokio::test]
async fn self_referral_is_rejected() {
    let app = app();
    let alice = Wallet::new(10);
    let response = post_signed(
        &app,
        "/api/referral/log",
        &alice,
        json!({ "referrerAddress": alice.address.to_uppercase().replacen("0X", "0x", 1) }),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Cannot refer yourself");
    assert_eq!(response.body["error"], "self_referral");

    let count = get(&app, &format!("/api/referral/count/{}", alice.address)).await;
    assert_eq!(count.body["data"]["count"], 0);
}

#[tokio::test]
async fn referral_lifecycle() {
    let app = app();
    let referrer = Wallet::new(11);
    let referee = Wallet::new(12);

    let first = post_signed(
        &app,
        "/api/referral/log",
        &referee,
        json!({ "referrerAddress": referrer.address }),
    )
    .await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(first.body["message"], "Referral logged successfully");
    assert_eq!(first.body["data"]["referee"], json!(referee.address));
    assert_eq!(first.body["data"]["status"], "completed");

    let second = post_signed(
        &app,
        "/api/referral/log",
        &referee,
        json!({ "referrerAddress": referrer.address }),
    )
    .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["message"], "Referral already recorded");
    assert_eq!(second.body["data"]["id"], first.body["data"]["id"]);

    let upper = format!("0x{}", referrer.address.trim_start_matches("0x").to_uppercase());
    let count = get(&app, &format!("/api/referral/count/{upper}")).await;
    assert_eq!(count.status, StatusCode::OK);
    assert_eq!(count.body["data"]["count"], 1);
    assert_eq!(count.body["data"]["referrals"][0]["referee"], json!(referee.address));

    let verified = post_signed(
        &app,
        "/api/referral/verify",
        &referee,
        json!({ "referrerAddress": referrer.address }),
    )
    .await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["data"]["isReferred"], true);

    let reversed = post_signed(
        &app,
        "/api/referral/verify",
        &referrer,
        json!({ "referrerAddress": referee.address }),
    )
    .await;
    assert_eq!(reversed.status, StatusCode::OK);
    assert_eq!(reversed.body["data"]["isReferred"], false);
    assert_eq!(reversed.body["data"]["referral"], Value::Null);
}

#[tokio::test]
async fn invalid_path_address_is_rejected() {
    let app = app();
    let response = get(&app, "/api/referral/count/not-a-wallet").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "invalid_address");
}

#[tokio::test]
async fn referral_link_uses_normalized_wallet() {
    let app = app();
    let wallet = Wallet::new(13);
    let upper = format!("0x{}", wallet.address.trim_start_matches("0x").to_uppercase());
    let response = get(&app, &format!("/api/referral/link/{upper}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["referralLink"],
        json!(format!("https://app.example/?ref={}", wallet.address))
    );
}

#[tokio::test]
async fn rate_limit_rejects_after_budget() {
    let app = app_with(GatewayConfig {
        rate_limit_max_requests: 2,
        ..GatewayConfig::default()
    });
    let wallet = Wallet::new(14).address;
    let uri = format!("/api/tracking/stats/{wallet}");

    let first = get(&app, &uri).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(
        first.headers.get("ratelimit-remaining").and_then(|v| v.to_str().ok()),
        Some("1")
    );
    assert_eq!(get(&app, &uri).await.status, StatusCode::OK);

    let limited = get(&app, &uri).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "rate_limited");
    assert!(limited.headers.get(header::RETRY_AFTER).is_some());

    assert_eq!(get(&app, "/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = app();
    let preflight = |origin: &'static str| {
        let Ok(request) = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/referral/log")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
        else {
            panic!("request build failed");
        };
        request
    };

    let Ok(allowed) = app.clone().oneshot(preflight("http://localhost:5173")).await else {
        panic!("router failed");
    };
    assert_eq!(
        allowed
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );

    let Ok(denied) = app.clone().oneshot(preflight("https://evil.example")).await else {
        panic!("router failed");
    };
    assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
