use sniper_common::redeem::DIRECT_BASE;

/// Relay configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Upstream redeem endpoint base. Overridable so tests can point the
    /// relay at a mock server.
    pub upstream_base: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            upstream_base: std::env::var("UPSTREAM_BASE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DIRECT_BASE.to_string()),
        }
    }
}
