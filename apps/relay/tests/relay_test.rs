//! Relay tests against a mock upstream endpoint.

use std::net::SocketAddr;

use axum::extract::Path;
use axum::response::Html;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use redeem_relay::config::Config;
use redeem_relay::{routes, AppState};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_relay(upstream: Router) -> (SocketAddr, AppState) {
    let upstream_addr = serve(upstream).await;
    let config = Config {
        port: 0,
        upstream_base: format!("http://{upstream_addr}/vouchers"),
    };
    let state = AppState::new(&config);
    let relay_addr = serve(routes::router().with_state(state.clone())).await;
    (relay_addr, state)
}

fn success_upstream() -> Router {
    Router::new().route(
        "/vouchers/{code}/redeem",
        post(|Path(code): Path<String>| async move {
            Json(json!({
                "status": { "code": "SUCCESS", "message": "Success" },
                "data": {
                    "voucher": { "amount_baht": "20.00" },
                    "owner_profile": { "full_name": "Somchai" },
                    "voucher_hash": code
                }
            }))
        }),
    )
}

fn challenge_upstream() -> Router {
    Router::new().route(
        "/vouchers/{code}/redeem",
        post(|| async { Html("<!DOCTYPE html><html>Attention Required!</html>") }),
    )
}

#[tokio::test]
async fn passes_the_upstream_envelope_through() {
    let (relay, state) = start_relay(success_upstream()).await;

    let body: Value = reqwest::get(format!("http://{relay}/proxy/AbC123/0812345678"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"]["code"], "SUCCESS");
    assert_eq!(body["data"]["voucher"]["amount_baht"], "20.00");
    assert_eq!(body["data"]["voucher_hash"], "AbC123");

    let snapshot = state.stats.snapshot();
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.success, 1);
}

#[tokio::test]
async fn accepts_body_based_redeem_calls() {
    let (relay, _state) = start_relay(success_upstream()).await;

    let body: Value = reqwest::Client::new()
        .post(format!("http://{relay}/redeem"))
        .json(&json!({ "mobile": "0812345678", "voucher": "AbC123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"]["code"], "SUCCESS");
}

#[tokio::test]
async fn classifies_challenge_pages_as_cloudflare_block() {
    let (relay, state) = start_relay(challenge_upstream()).await;

    let body: Value = reqwest::get(format!("http://{relay}/proxy/AbC123/0812345678"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"]["code"], "CLOUDFLARE_BLOCK");
    assert_eq!(state.stats.snapshot().cloudflare, 1);
}

#[tokio::test]
async fn unreachable_upstream_maps_to_error_envelope() {
    let config = Config {
        port: 0,
        upstream_base: "http://127.0.0.1:9/vouchers".to_string(),
    };
    let state = AppState::new(&config);
    let relay = serve(routes::router().with_state(state.clone())).await;

    let response = reqwest::get(format!("http://{relay}/proxy/AbC123/0812345678"))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"]["code"], "ERROR");
    assert_eq!(state.stats.snapshot().failed, 1);
}

#[tokio::test]
async fn health_and_index_report_status() {
    let (relay, _state) = start_relay(success_upstream()).await;

    let health: Value = reqwest::get(format!("http://{relay}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let index: Value = reqwest::get(format!("http://{relay}/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(index["status"], "online");
    assert_eq!(index["stats"]["total"], 0);
}
