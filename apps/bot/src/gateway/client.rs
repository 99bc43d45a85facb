//! Connection driver: owns the WebSocket, executes state-machine actions,
//! and reconnects with backoff.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::backoff::Backoff;
use super::events::{GatewayFrame, OutboundFrame};
use super::session::{Action, GatewayEvent, SessionState};

pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Identify is delayed by a random 1-4s so a fleet of restarting clients
/// does not stampede the gateway.
const IDENTIFY_JITTER_MS: std::ops::Range<u64> = 1000..4000;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

enum Flow {
    Continue,
    Reconnect,
    Stop,
}

pub struct GatewayClient {
    url: String,
    token: String,
    events: mpsc::UnboundedSender<GatewayEvent>,
    backoff: Backoff,
}

impl GatewayClient {
    pub fn new(
        url: impl Into<String>,
        token: impl Into<String>,
        events: mpsc::UnboundedSender<GatewayEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            events,
            backoff: Backoff::new(),
        }
    }

    /// Override the reconnect schedule (used by tests).
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Connect and keep the session alive until the event receiver is
    /// dropped or the reconnect budget is exhausted.
    pub async fn run(mut self) {
        let mut session = SessionState::new();
        loop {
            if let Flow::Stop = self.drive_connection(&mut session).await {
                return;
            }
            session.on_disconnected();

            let Some(delay) = self.backoff.next_delay() else {
                tracing::error!("max reconnect attempts reached, giving up");
                return;
            };
            tracing::info!(
                attempt = self.backoff.attempt(),
                delay_ms = delay.as_millis() as u64,
                "reconnecting after backoff"
            );
            time::sleep(delay).await;
        }
    }

    async fn drive_connection(&mut self, session: &mut SessionState) -> Flow {
        let (ws, _) = match connect_async(&self.url).await {
            Ok(ok) => ok,
            Err(err) => {
                tracing::warn!(error = %err, "gateway connect failed");
                return Flow::Reconnect;
            }
        };
        tracing::info!("connected to gateway");
        self.backoff.reset();
        session.on_connected();

        let (mut sink, mut stream) = ws.split();
        // Placeholder until HELLO supplies the real interval.
        let mut heartbeat = interval_after(Duration::from_secs(3600));

        loop {
            tokio::select! {
                frame = stream.next() => {
                    let message = match frame {
                        Some(Ok(m)) => m,
                        Some(Err(err)) => {
                            tracing::warn!(error = %err, "gateway read error");
                            return Flow::Reconnect;
                        }
                        None => {
                            tracing::warn!("gateway stream ended");
                            return Flow::Reconnect;
                        }
                    };

                    match message {
                        Message::Text(text) => {
                            let frame: GatewayFrame = match serde_json::from_str(&text) {
                                Ok(f) => f,
                                Err(err) => {
                                    tracing::debug!(?err, "unparseable gateway frame");
                                    continue;
                                }
                            };
                            for action in session.on_frame(frame) {
                                match self.apply(action, &mut sink, &mut heartbeat).await {
                                    Flow::Continue => {}
                                    other => return other,
                                }
                            }
                        }
                        Message::Close(close) => {
                            tracing::warn!(?close, "gateway closed the connection");
                            return Flow::Reconnect;
                        }
                        Message::Ping(_) | Message::Pong(_) => continue,
                        _ => continue,
                    }
                }

                _ = heartbeat.tick() => {
                    match self.apply(session.on_heartbeat_due(), &mut sink, &mut heartbeat).await {
                        Flow::Continue => {}
                        other => return other,
                    }
                }
            }
        }
    }

    async fn apply(
        &self,
        action: Action,
        sink: &mut WsSink,
        heartbeat: &mut time::Interval,
    ) -> Flow {
        match action {
            Action::StartHeartbeat(interval) => {
                tracing::debug!(interval_ms = interval.as_millis() as u64, "heartbeat started");
                *heartbeat = interval_after(interval);
                Flow::Continue
            }
            Action::SendIdentify => {
                let jitter = rand::thread_rng().gen_range(IDENTIFY_JITTER_MS);
                time::sleep(Duration::from_millis(jitter)).await;
                self.send(sink, OutboundFrame::identify(&self.token)).await
            }
            Action::SendResume { session_id, seq } => {
                tracing::info!(%session_id, seq, "resuming session");
                self.send(sink, OutboundFrame::resume(&self.token, &session_id, seq))
                    .await
            }
            Action::SendHeartbeat { seq } => self.send(sink, OutboundFrame::heartbeat(seq)).await,
            Action::Emit(event) => {
                if self.events.send(event).is_err() {
                    tracing::info!("event receiver dropped, stopping gateway client");
                    return Flow::Stop;
                }
                Flow::Continue
            }
            Action::Reconnect { reason } => {
                tracing::warn!(reason, "forcing reconnect");
                Flow::Reconnect
            }
        }
    }

    async fn send(&self, sink: &mut WsSink, frame: OutboundFrame) -> Flow {
        match sink.send(Message::Text(frame.to_json().into())).await {
            Ok(()) => Flow::Continue,
            Err(err) => {
                tracing::warn!(error = %err, "gateway write failed");
                Flow::Reconnect
            }
        }
    }
}

/// An interval whose first tick fires one full period from now.
fn interval_after(period: Duration) -> time::Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
