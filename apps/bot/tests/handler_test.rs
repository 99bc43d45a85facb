//! Message-handler tests against a mock redeem endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use sniper_bot::config::Config;
use sniper_bot::gateway::events::{Author, MessageCreate};
use sniper_bot::notify::Notification;
use sniper_bot::{handler, notify, AppState};
use sniper_common::RedeemClient;

#[derive(Clone)]
struct Upstream {
    calls: Arc<AtomicUsize>,
    succeed: bool,
}

async fn redeem_route(
    State(upstream): State<Upstream>,
    Path(_code): Path<String>,
) -> Json<Value> {
    upstream.calls.fetch_add(1, Ordering::SeqCst);
    if upstream.succeed {
        Json(json!({
            "status": { "code": "SUCCESS" },
            "data": {
                "voucher": { "amount_baht": "20.00" },
                "owner_profile": { "full_name": "Somchai" }
            }
        }))
    } else {
        Json(json!({
            "status": { "code": "VOUCHER_OUT_OF_STOCK", "message": "Voucher already redeemed" }
        }))
    }
}

async fn start_upstream(succeed: bool) -> (SocketAddr, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/vouchers/{code}/redeem", post(redeem_route))
        .with_state(Upstream {
            calls: calls.clone(),
            succeed,
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, calls)
}

fn test_state(addr: SocketAddr) -> (AppState, mpsc::UnboundedReceiver<Notification>) {
    let config = Config {
        phone: "0812345678".to_string(),
        discord_token: "token".to_string(),
        port: 0,
        gateway_url: "ws://unused.invalid".to_string(),
        redeem_proxy_url: None,
        webhook_url: None,
        notify_user_id: None,
        send_fail_message: true,
    };
    let (notify_handle, notify_rx) = notify::channel();
    let mut state = AppState::new(config, notify_handle);
    state.redeemer =
        RedeemClient::new("0812345678").with_direct_base(format!("http://{addr}/vouchers"));
    (state, notify_rx)
}

fn message(content: &str) -> MessageCreate {
    MessageCreate {
        content: content.to_string(),
        channel_id: "chan1".to_string(),
        author: Some(Author {
            id: "u1".to_string(),
            bot: false,
        }),
        attachments: vec![],
    }
}

const LINK: &str = "https://gift.truemoney.com/campaign/?v=AbC123XyZ9";

#[tokio::test]
async fn duplicate_codes_are_redeemed_once() {
    let (addr, calls) = start_upstream(true).await;
    let (state, _notify_rx) = test_state(addr);

    handler::handle_message(state.clone(), message(LINK)).await;
    handler::handle_message(state.clone(), message(LINK)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let snapshot = state.stats.snapshot();
    assert_eq!(snapshot.success, 1);
    assert_eq!(snapshot.total_baht, 20.0);
    assert_eq!(state.redeemed.len(), 1);
}

#[tokio::test]
async fn failed_codes_stay_retryable() {
    let (addr, calls) = start_upstream(false).await;
    let (state, _notify_rx) = test_state(addr);

    handler::handle_message(state.clone(), message(LINK)).await;
    handler::handle_message(state.clone(), message(LINK)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let snapshot = state.stats.snapshot();
    assert_eq!(snapshot.success, 0);
    assert_eq!(snapshot.failed, 2);
    assert!(state.redeemed.is_empty());
}

#[tokio::test]
async fn bot_authors_are_ignored() {
    let (addr, calls) = start_upstream(true).await;
    let (state, _notify_rx) = test_state(addr);

    let mut bot_message = message(LINK);
    bot_message.author = Some(Author {
        id: "u2".to_string(),
        bot: true,
    });
    handler::handle_message(state, bot_message).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn messages_without_a_code_are_skipped() {
    let (addr, calls) = start_upstream(true).await;
    let (state, _notify_rx) = test_state(addr);

    handler::handle_message(state, message("hello there")).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn success_is_notified() {
    let (addr, _calls) = start_upstream(true).await;
    let (state, mut notify_rx) = test_state(addr);

    handler::handle_message(state, message(LINK)).await;

    let notification = notify_rx.recv().await.expect("notification queued");
    assert!(notification.content.contains("20฿"));
    assert!(notification.content.contains("Somchai"));
}

#[tokio::test]
async fn failure_is_notified_when_enabled() {
    let (addr, _calls) = start_upstream(false).await;
    let (state, mut notify_rx) = test_state(addr);

    handler::handle_message(state, message(LINK)).await;

    let notification = notify_rx.recv().await.expect("notification queued");
    assert!(notification.content.contains("VOUCHER_OUT_OF_STOCK"));
}

#[tokio::test]
async fn ping_command_replies_without_redeeming() {
    let (addr, calls) = start_upstream(true).await;
    let (state, mut notify_rx) = test_state(addr);

    handler::handle_message(state, message("!ping")).await;

    let notification = notify_rx.recv().await.expect("notification queued");
    assert!(notification.content.contains("Pong"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
