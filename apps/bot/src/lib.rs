pub mod config;
pub mod gateway;
pub mod handler;
pub mod notify;
pub mod qr;
pub mod routes;
pub mod stats;

use std::sync::Arc;

use dashmap::DashMap;

use config::Config;
use notify::NotifyHandle;
use sniper_common::RedeemClient;
use stats::Stats;

/// Shared context passed to the message handler and the liveness routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Client for attachment downloads and other plain HTTP calls.
    pub http: reqwest::Client,
    pub redeemer: RedeemClient,
    /// Voucher codes already submitted. Insert-if-absent is the duplicate
    /// gate; failed codes are removed again so they stay retryable.
    pub redeemed: Arc<DashMap<String, ()>>,
    pub stats: Arc<Stats>,
    pub notifier: NotifyHandle,
}

impl AppState {
    pub fn new(config: Config, notifier: NotifyHandle) -> Self {
        let mut redeemer = RedeemClient::new(config.phone.clone());
        if let Some(url) = &config.redeem_proxy_url {
            redeemer = redeemer.with_proxy(url.clone());
        }
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            redeemer,
            redeemed: Arc::new(DashMap::new()),
            stats: Arc::new(Stats::new()),
            notifier,
        }
    }
}
