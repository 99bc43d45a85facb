//! Liveness endpoints so the hosting platform keeps the process alive.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/stats", get(stats))
}

async fn index(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.stats.snapshot();
    Json(json!({
        "status": "online",
        "message": "Voucher sniper running",
        "uptime": snapshot.uptime_secs,
        "stats": snapshot,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.stats.snapshot();
    Json(json!({
        "success": snapshot.success,
        "failed": snapshot.failed,
        "success_rate": snapshot.success_rate(),
        "total_baht": snapshot.total_baht,
        "uptime_secs": snapshot.uptime_secs,
        "unique_vouchers": state.redeemed.len(),
        "method": if state.config.redeem_proxy_url.is_some() { "proxy" } else { "direct" },
    }))
}
