//! Redeem client for the TrueMoney gift-voucher endpoint.
//!
//! Two call paths exist: direct against the public endpoint, or through a
//! self-hosted relay that provides a different egress IP. Both return a
//! [`RedeemOutcome`] — transport failures, timeouts, and malformed bodies
//! never escape as errors.

use std::time::Duration;

use serde_json::{json, Value};

/// Public redeem endpoint, minus the trailing `/{code}/redeem`.
pub const DIRECT_BASE: &str = "https://gift.truemoney.com/campaign/vouchers";

/// Browser-like user agent for the direct path. The endpoint sits behind
/// bot detection and rejects obvious non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CHALLENGE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Result of one redeem attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RedeemOutcome {
    Success { amount: f64, owner_name: String },
    Failure { code: String, message: String },
}

impl RedeemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RedeemOutcome::Success { .. })
    }

    fn transport_failure(err: impl std::fmt::Display) -> Self {
        RedeemOutcome::Failure {
            code: "ERROR".to_string(),
            message: err.to_string(),
        }
    }
}

/// One redeem attempt on the direct path, before challenge handling.
enum DirectAttempt {
    Outcome(RedeemOutcome),
    Challenged,
}

#[derive(Debug, Clone)]
pub struct RedeemClient {
    http: reqwest::Client,
    phone: String,
    direct_base: String,
    proxy_url: Option<String>,
}

impl RedeemClient {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            phone: phone.into(),
            direct_base: DIRECT_BASE.to_string(),
            proxy_url: None,
        }
    }

    /// Route redeem calls through a relay instead of the public endpoint.
    pub fn with_proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    /// Override the direct endpoint base (used by tests).
    pub fn with_direct_base(mut self, url: impl Into<String>) -> Self {
        self.direct_base = url.into();
        self
    }

    /// Submit a voucher code for redemption.
    ///
    /// Not idempotent: the caller is responsible for not resubmitting a
    /// code that already succeeded.
    pub async fn redeem(&self, code: &str) -> RedeemOutcome {
        match &self.proxy_url {
            Some(url) => self.redeem_via_proxy(url, code).await,
            None => self.redeem_direct(code).await,
        }
    }

    async fn redeem_via_proxy(&self, url: &str, code: &str) -> RedeemOutcome {
        let response = self
            .http
            .post(url)
            .json(&json!({ "mobile": self.phone, "voucher": code }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) => return RedeemOutcome::transport_failure(err),
        };

        match response.json::<Value>().await {
            Ok(body) => parse_envelope(&body),
            Err(err) => RedeemOutcome::transport_failure(err),
        }
    }

    async fn redeem_direct(&self, code: &str) -> RedeemOutcome {
        match self.direct_attempt(code).await {
            DirectAttempt::Outcome(outcome) => outcome,
            DirectAttempt::Challenged => {
                tracing::warn!(code, "challenge page from redeem endpoint, retrying once");
                tokio::time::sleep(CHALLENGE_RETRY_DELAY).await;
                match self.direct_attempt(code).await {
                    DirectAttempt::Outcome(outcome) => outcome,
                    DirectAttempt::Challenged => RedeemOutcome::Failure {
                        code: "CLOUDFLARE_BLOCK".to_string(),
                        message: "Blocked by Cloudflare".to_string(),
                    },
                }
            }
        }
    }

    async fn direct_attempt(&self, code: &str) -> DirectAttempt {
        let url = format!("{}/{}/redeem", self.direct_base, code);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .json(&json!({ "mobile": self.phone, "voucher_hash": code }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) => return DirectAttempt::Outcome(RedeemOutcome::transport_failure(err)),
        };

        let text = match response.text().await {
            Ok(t) => t,
            Err(err) => return DirectAttempt::Outcome(RedeemOutcome::transport_failure(err)),
        };

        match parse_upstream_body(&text) {
            Some(body) => DirectAttempt::Outcome(parse_envelope(&body)),
            None => DirectAttempt::Challenged,
        }
    }
}

/// Parse an upstream response body.
///
/// Returns `None` for non-JSON bodies and for JSON without a `status`
/// object — both are how the endpoint's bot-challenge pages look.
pub fn parse_upstream_body(text: &str) -> Option<Value> {
    let body: Value = serde_json::from_str(text).ok()?;
    body.get("status").is_some().then_some(body)
}

/// Map a redeem envelope to an outcome.
///
/// On success the credited amount may live at `data.my_ticket.amount_baht`
/// (proxy responses), `data.voucher.amount_baht` (direct responses), or
/// `data.amount_baht`, as a number or a string with thousands separators.
pub fn parse_envelope(body: &Value) -> RedeemOutcome {
    let status = &body["status"];
    let code = status["code"].as_str().unwrap_or("ERROR");

    if code == "SUCCESS" {
        let data = &body["data"];
        let amount = extract_amount(data).unwrap_or(0.0);
        let owner_name = data["owner_profile"]["full_name"]
            .as_str()
            .unwrap_or("Unknown")
            .to_string();
        return RedeemOutcome::Success { amount, owner_name };
    }

    let message = status["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string());
    RedeemOutcome::Failure {
        code: code.to_string(),
        message,
    }
}

fn extract_amount(data: &Value) -> Option<f64> {
    let candidates = [
        &data["my_ticket"]["amount_baht"],
        &data["voucher"]["amount_baht"],
        &data["amount_baht"],
    ];
    for value in candidates {
        match value {
            Value::String(s) => {
                if let Ok(n) = s.replace(',', "").parse::<f64>() {
                    return Some(n);
                }
            }
            Value::Number(n) => return n.as_f64(),
            _ => {}
        }
    }
    None
}
