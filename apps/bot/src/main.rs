use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sniper_bot::config::Config;
use sniper_bot::gateway::{GatewayClient, GatewayEvent};
use sniper_bot::notify::Notifier;
use sniper_bot::{handler, notify, routes, AppState};

const ALIVE_LOG_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing — env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    tracing::info!(
        phone = %config.masked_phone(),
        method = if config.redeem_proxy_url.is_some() { "proxy" } else { "direct" },
        send_fail_message = config.send_fail_message,
        "sniper-bot configured"
    );

    let (notify_handle, notify_rx) = notify::channel();
    tokio::spawn(Notifier::from_config(&config).run(notify_rx));

    let state = AppState::new(config, notify_handle);

    // Liveness server so the hosting platform keeps the process alive.
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    tracing::info!(%addr, "liveness server listening");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("server error") });

    // Periodic alive line so a quiet bot still shows up in the logs.
    {
        let stats = state.stats.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(ALIVE_LOG_INTERVAL);
            tick.tick().await;
            loop {
                tick.tick().await;
                let snapshot = stats.snapshot();
                tracing::info!(
                    uptime_secs = snapshot.uptime_secs,
                    success = snapshot.success,
                    total_baht = snapshot.total_baht,
                    "alive"
                );
            }
        });
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let client = GatewayClient::new(
        state.config.gateway_url.clone(),
        state.config.discord_token.clone(),
        event_tx,
    );
    tokio::spawn(client.run());

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(GatewayEvent::Ready { user }) => {
                    tracing::info!(
                        user_id = %user.id,
                        username = %user.username,
                        "logged in"
                    );
                }
                Some(GatewayEvent::Resumed) => {
                    tracing::info!("session resumed");
                }
                Some(GatewayEvent::Message(message)) => {
                    // Spawned so a slow redeem never blocks the gateway.
                    tokio::spawn(handler::handle_message(state.clone(), *message));
                }
                None => {
                    tracing::error!("gateway client stopped");
                    break;
                }
            },
            _ = shutdown_signal() => break,
        }
    }

    let snapshot = state.stats.snapshot();
    tracing::info!(
        success = snapshot.success,
        failed = snapshot.failed,
        total_baht = snapshot.total_baht,
        "shutting down"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
