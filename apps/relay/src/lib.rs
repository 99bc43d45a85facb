pub mod config;
pub mod routes;
pub mod stats;

use std::sync::Arc;

use config::Config;
use stats::RelayStats;

/// Shared context for the relay routes.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    /// Upstream redeem endpoint, minus the trailing `/{code}/redeem`.
    pub upstream_base: Arc<String>,
    pub stats: Arc<RelayStats>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream_base: Arc::new(config.upstream_base.clone()),
            stats: Arc::new(RelayStats::new()),
        }
    }
}
