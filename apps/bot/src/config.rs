use crate::gateway::client::DEFAULT_GATEWAY_URL;

/// Bot configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Wallet phone number credited on redeem.
    pub phone: String,
    /// Gateway credential for the user account.
    pub discord_token: String,
    /// Port the liveness HTTP server binds to.
    pub port: u16,
    /// Realtime gateway endpoint.
    pub gateway_url: String,
    /// When set, redeem calls go through this relay instead of the public
    /// endpoint.
    pub redeem_proxy_url: Option<String>,
    /// Webhook sink for notifications. Takes precedence over the DM sink.
    pub webhook_url: Option<String>,
    /// User to DM notifications and command replies to.
    pub notify_user_id: Option<String>,
    /// Whether failed redeems are notified too, or only logged.
    pub send_fail_message: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            phone: required_var("PHONE"),
            discord_token: required_var("DISCORD_TOKEN"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            gateway_url: std::env::var("GATEWAY_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            redeem_proxy_url: optional_var("REDEEM_PROXY_URL"),
            webhook_url: optional_var("WEBHOOK_URL"),
            notify_user_id: optional_var("NOTIFY_USER_ID"),
            send_fail_message: std::env::var("SEND_FAIL_MESSAGE")
                .map(|v| v == "true")
                .unwrap_or(false),
        }
    }

    /// Phone number with the middle digits starred out, for logs.
    pub fn masked_phone(&self) -> String {
        mask_phone(&self.phone)
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn mask_phone(phone: &str) -> String {
    if phone.len() < 7 {
        return "*".repeat(phone.len());
    }
    let (head, rest) = phone.split_at(3);
    let (mid, tail) = rest.split_at(rest.len() - 3);
    format!("{head}{}{tail}", "*".repeat(mid.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_middle_digits() {
        assert_eq!(mask_phone("0812345678"), "081****678");
    }

    #[test]
    fn short_values_are_fully_masked() {
        assert_eq!(mask_phone("12345"), "*****");
    }
}
