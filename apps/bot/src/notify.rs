//! Best-effort notification side channel.
//!
//! The redeem path pushes messages onto an unbounded queue and moves on; a
//! dedicated task drains the queue and delivers. Delivery failures are
//! logged and dropped — they never feed back into redemption.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::stats::StatsSnapshot;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug)]
pub struct Notification {
    pub content: String,
}

/// Cheap clonable handle held by the message handler.
#[derive(Clone)]
pub struct NotifyHandle {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotifyHandle {
    pub fn send(&self, content: impl Into<String>) {
        // A closed queue means the process is shutting down.
        let _ = self.tx.send(Notification {
            content: content.into(),
        });
    }
}

pub fn channel() -> (NotifyHandle, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotifyHandle { tx }, rx)
}

/// Where notifications end up.
pub enum Sink {
    /// POST `{ "content": ... }` to a webhook URL.
    Webhook(String),
    /// Open a DM channel with the user, then post into it.
    DirectMessage { token: String, user_id: String },
    /// No sink configured; notifications only reach the log.
    LogOnly,
}

pub struct Notifier {
    http: reqwest::Client,
    sink: Sink,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Self {
        let sink = if let Some(url) = &config.webhook_url {
            Sink::Webhook(url.clone())
        } else if let Some(user_id) = &config.notify_user_id {
            Sink::DirectMessage {
                token: config.discord_token.clone(),
                user_id: user_id.clone(),
            }
        } else {
            Sink::LogOnly
        };
        Self::with_sink(sink)
    }

    pub fn with_sink(sink: Sink) -> Self {
        Self {
            http: reqwest::Client::new(),
            sink,
        }
    }

    /// Drain the queue until every handle is dropped.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<Notification>) {
        while let Some(notification) = rx.recv().await {
            if let Err(err) = self.deliver(&notification.content).await {
                tracing::warn!(error = %err, "notification delivery failed");
            }
        }
    }

    async fn deliver(&self, content: &str) -> Result<(), reqwest::Error> {
        match &self.sink {
            Sink::Webhook(url) => {
                self.http
                    .post(url)
                    .json(&json!({ "content": content }))
                    .timeout(DELIVERY_TIMEOUT)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok(())
            }
            Sink::DirectMessage { token, user_id } => {
                self.send_dm(token, user_id, content).await
            }
            Sink::LogOnly => {
                tracing::info!(%content, "notification");
                Ok(())
            }
        }
    }

    async fn send_dm(
        &self,
        token: &str,
        user_id: &str,
        content: &str,
    ) -> Result<(), reqwest::Error> {
        let channel: serde_json::Value = self
            .http
            .post(format!("{DISCORD_API_BASE}/users/@me/channels"))
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&json!({ "recipient_id": user_id }))
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(channel_id) = channel["id"].as_str() else {
            tracing::warn!("DM channel response had no id");
            return Ok(());
        };

        self.http
            .post(format!("{DISCORD_API_BASE}/channels/{channel_id}/messages"))
            .header(reqwest::header::AUTHORIZATION, token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&json!({ "content": content }))
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Message texts
// ---------------------------------------------------------------------------

pub fn success_message(amount: f64, owner_name: &str, channel_id: &str, from_qr: bool) -> String {
    let mut message = format!("✅ Received {amount}฿ from {owner_name}\n📍 Channel: <#{channel_id}>");
    if from_qr {
        message.push_str("\n🖼️ From QR code");
    }
    message
}

pub fn failure_message(code: &str, reason: &str) -> String {
    format!("❌ Redeem failed ({code}): {reason}")
}

pub fn stats_message(snapshot: &StatsSnapshot, unique_vouchers: usize, via_proxy: bool) -> String {
    format!(
        "📊 **Bot Statistics**\n\
         ✅ Success: {}\n\
         ❌ Failed: {}\n\
         📈 Success Rate: {:.1}%\n\
         💰 Total Earned: {}฿\n\
         ⏱️ Uptime: {}h {}m\n\
         🔢 Processed: {} unique vouchers\n\
         🔧 Method: {}",
        snapshot.success,
        snapshot.failed,
        snapshot.success_rate(),
        snapshot.total_baht,
        snapshot.uptime_secs / 3600,
        (snapshot.uptime_secs % 3600) / 60,
        unique_vouchers,
        if via_proxy { "Proxy" } else { "Direct" },
    )
}

pub fn help_message() -> &'static str {
    "🤖 **Available Commands**\n\
     `!ping` - Check bot status\n\
     `!stats` - View statistics\n\
     `!help` - Show this help\n\n\
     **How to use:**\n\
     Send a voucher link or QR code image and the bot redeems it automatically."
}
