//! Relay routes: forward redeem calls upstream from a different egress IP
//! and pass the envelope back verbatim.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use sniper_common::redeem::{parse_upstream_body, BROWSER_USER_AGENT};

use crate::AppState;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/proxy/{voucher}/{phone}", get(proxy))
        .route("/redeem", post(redeem))
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "Redeem relay running",
        "stats": state.stats.snapshot(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime": state.stats.snapshot().uptime_secs,
    }))
}

async fn proxy(
    State(state): State<AppState>,
    Path((voucher, phone)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    forward(&state, &voucher, &phone).await
}

#[derive(Debug, Deserialize)]
struct RedeemRequest {
    mobile: String,
    voucher: String,
}

/// Body-based variant of [`proxy`], matching the bot's proxy-mode call.
async fn redeem(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> (StatusCode, Json<Value>) {
    forward(&state, &request.voucher, &request.mobile).await
}

async fn forward(state: &AppState, voucher: &str, phone: &str) -> (StatusCode, Json<Value>) {
    state.stats.record_request();

    let url = format!("{}/{}/redeem", state.upstream_base, voucher);
    let response = state
        .http
        .post(&url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .json(&json!({ "mobile": phone, "voucher_hash": voucher }))
        .timeout(UPSTREAM_TIMEOUT)
        .send()
        .await;

    let text = match response {
        Ok(r) => r.text().await,
        Err(err) => Err(err),
    };
    let text = match text {
        Ok(t) => t,
        Err(err) => {
            state.stats.record_failure();
            tracing::error!(voucher, error = %err, "upstream call failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": { "code": "ERROR", "message": err.to_string() }
                })),
            );
        }
    };

    match parse_upstream_body(&text) {
        Some(body) => {
            if body["status"]["code"] == "SUCCESS" {
                state.stats.record_success();
            } else {
                state.stats.record_failure();
            }
            tracing::info!(voucher, code = %body["status"]["code"], "upstream envelope relayed");
            (StatusCode::OK, Json(body))
        }
        None => {
            state.stats.record_cloudflare();
            tracing::warn!(voucher, "upstream returned a challenge page");
            (
                StatusCode::OK,
                Json(json!({
                    "status": { "code": "CLOUDFLARE_BLOCK", "message": "Blocked by Cloudflare" }
                })),
            )
        }
    }
}
