//! Gateway opcodes, wire-format frames, and dispatch payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_IDENTIFY: u8 = 2;
pub const OP_RESUME: u8 = 6;
pub const OP_RECONNECT: u8 = 7;
pub const OP_INVALID_SESSION: u8 = 9;
pub const OP_HELLO: u8 = 10;
pub const OP_HEARTBEAT_ACK: u8 = 11;

// ---------------------------------------------------------------------------
// Gateway → client frame
// ---------------------------------------------------------------------------

/// A frame received from the gateway.
#[derive(Debug, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub d: Value,
}

// ---------------------------------------------------------------------------
// Client → gateway frame
// ---------------------------------------------------------------------------

/// A frame sent to the gateway.
#[derive(Debug, Serialize)]
pub struct OutboundFrame {
    pub op: u8,
    pub d: Value,
}

impl OutboundFrame {
    /// Build a HEARTBEAT frame (op=1), carrying the last seen sequence.
    pub fn heartbeat(seq: Option<u64>) -> Self {
        Self {
            op: OP_HEARTBEAT,
            d: seq.map(Into::into).unwrap_or(Value::Null),
        }
    }

    /// Build an IDENTIFY frame (op=2) with a browser-like client profile.
    pub fn identify(token: &str) -> Self {
        Self {
            op: OP_IDENTIFY,
            d: json!({
                "token": token,
                "capabilities": 16381,
                "properties": {
                    "os": "Linux",
                    "browser": "Chrome",
                    "device": "",
                    "system_locale": "en-US",
                    "browser_user_agent": "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
                    "browser_version": "120.0.0.0",
                    "os_version": "",
                    "referrer": "",
                    "referring_domain": "",
                    "referrer_current": "",
                    "referring_domain_current": "",
                    "release_channel": "stable",
                    "client_build_number": 261954,
                    "client_event_source": null
                },
                "presence": {
                    "status": "online",
                    "since": 0,
                    "activities": [],
                    "afk": false
                },
                "compress": false,
                "client_state": {
                    "guild_versions": {}
                }
            }),
        }
    }

    /// Build a RESUME frame (op=6) for a previously established session.
    pub fn resume(token: &str, session_id: &str, seq: u64) -> Self {
        Self {
            op: OP_RESUME,
            d: json!({
                "token": token,
                "session_id": session_id,
                "seq": seq
            }),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Dispatch event names
// ---------------------------------------------------------------------------

pub struct EventName;

impl EventName {
    pub const READY: &'static str = "READY";
    pub const RESUMED: &'static str = "RESUMED";
    pub const MESSAGE_CREATE: &'static str = "MESSAGE_CREATE";
}

// ---------------------------------------------------------------------------
// Dispatch payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    #[serde(default)]
    pub user: ReadyUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadyUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    #[serde(default)]
    pub content: String,
    pub channel_id: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentInfo {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl AttachmentInfo {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}
