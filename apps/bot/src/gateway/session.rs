//! Connection-side session state machine.
//!
//! Holds no socket. The connection driver feeds it frames and timer events
//! and executes the actions it returns, so every transition can be unit
//! tested with synthetic frames.

use std::time::Duration;

use super::events::{
    EventName, GatewayFrame, HelloPayload, MessageCreate, ReadyPayload, ReadyUser, OP_DISPATCH,
    OP_HEARTBEAT_ACK, OP_HELLO, OP_INVALID_SESSION, OP_RECONNECT,
};

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingHello,
    Identifying,
    Resuming,
    Ready,
    Backoff,
}

/// Something the driver must do in response to an input.
#[derive(Debug)]
pub enum Action {
    /// Start (or restart) the heartbeat timer at the given interval.
    StartHeartbeat(Duration),
    /// Send IDENTIFY after a short random jitter.
    SendIdentify,
    /// Send RESUME for the held session.
    SendResume { session_id: String, seq: u64 },
    /// Send a heartbeat carrying the last seen sequence.
    SendHeartbeat { seq: Option<u64> },
    /// Surface a decoded application event.
    Emit(GatewayEvent),
    /// The connection must be torn down and re-established.
    Reconnect { reason: &'static str },
}

/// Decoded application events surfaced to the rest of the bot.
#[derive(Debug)]
pub enum GatewayEvent {
    Ready { user: ReadyUser },
    Resumed,
    Message(Box<MessageCreate>),
}

/// Per-process session state: phase, resume bookkeeping, heartbeat ack flag.
#[derive(Debug)]
pub struct SessionState {
    phase: Phase,
    session_id: Option<String>,
    last_seq: Option<u64>,
    heartbeat_acked: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            session_id: None,
            last_seq: None,
            heartbeat_acked: true,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Whether a dropped connection can be resumed instead of re-identified.
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.last_seq.is_some()
    }

    /// The socket has been opened; the gateway speaks first with HELLO.
    pub fn on_connected(&mut self) {
        self.phase = Phase::AwaitingHello;
        self.heartbeat_acked = true;
    }

    /// The socket closed. Session id and sequence are preserved so the next
    /// connection can resume.
    pub fn on_disconnected(&mut self) {
        self.phase = Phase::Backoff;
    }

    /// Process one inbound frame.
    pub fn on_frame(&mut self, frame: GatewayFrame) -> Vec<Action> {
        if let Some(s) = frame.s {
            self.last_seq = Some(s);
        }

        match frame.op {
            OP_HELLO => {
                let hello: HelloPayload = match serde_json::from_value(frame.d) {
                    Ok(h) => h,
                    Err(_) => return vec![Action::Reconnect { reason: "malformed hello" }],
                };
                let mut actions = vec![Action::StartHeartbeat(Duration::from_millis(
                    hello.heartbeat_interval,
                ))];
                match (&self.session_id, self.last_seq) {
                    (Some(session_id), Some(seq)) => {
                        self.phase = Phase::Resuming;
                        actions.push(Action::SendResume {
                            session_id: session_id.clone(),
                            seq,
                        });
                    }
                    _ => {
                        self.phase = Phase::Identifying;
                        actions.push(Action::SendIdentify);
                    }
                }
                actions
            }
            OP_DISPATCH => self.on_dispatch(frame.t.as_deref(), frame.d),
            OP_HEARTBEAT_ACK => {
                self.heartbeat_acked = true;
                Vec::new()
            }
            OP_INVALID_SESSION => {
                self.session_id = None;
                self.last_seq = None;
                vec![Action::Reconnect { reason: "invalid session" }]
            }
            OP_RECONNECT => vec![Action::Reconnect { reason: "reconnect requested" }],
            _ => Vec::new(),
        }
    }

    /// The heartbeat timer fired. If the previous heartbeat was never
    /// acknowledged the connection is considered dead.
    pub fn on_heartbeat_due(&mut self) -> Action {
        if !self.heartbeat_acked {
            return Action::Reconnect { reason: "heartbeat not acknowledged" };
        }
        self.heartbeat_acked = false;
        Action::SendHeartbeat { seq: self.last_seq }
    }

    fn on_dispatch(&mut self, event: Option<&str>, data: serde_json::Value) -> Vec<Action> {
        match event {
            Some(EventName::READY) => {
                let ready: ReadyPayload = match serde_json::from_value(data) {
                    Ok(r) => r,
                    Err(err) => {
                        tracing::warn!(?err, "unparseable READY payload");
                        return Vec::new();
                    }
                };
                self.session_id = Some(ready.session_id);
                self.phase = Phase::Ready;
                vec![Action::Emit(GatewayEvent::Ready { user: ready.user })]
            }
            Some(EventName::RESUMED) => {
                self.phase = Phase::Ready;
                vec![Action::Emit(GatewayEvent::Resumed)]
            }
            Some(EventName::MESSAGE_CREATE) => match serde_json::from_value(data) {
                Ok(message) => vec![Action::Emit(GatewayEvent::Message(Box::new(message)))],
                Err(err) => {
                    tracing::debug!(?err, "unparseable MESSAGE_CREATE payload");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
