//! `canopy-dashboard` -- live monitoring gateway.
//!
//! Subscribes to the raw and event telemetry channels and re-broadcasts
//! everything to connected WebSocket clients. Also accepts simulation
//! commands over HTTP and forwards them to the edge nodes via the
//! control topic. Holds no state of its own: it renders whatever is on
//! the bus right now.
//!
//! # Environment variables
//!
//! | Variable       | Required | Default                 | Description          |
//! |----------------|----------|-------------------------|----------------------|
//! | `HOST`         | no       | `0.0.0.0`               | HTTP bind address    |
//! | `PORT`         | no       | `3000`                  | HTTP bind port       |
//! | `MQTT_BROKER`  | no       | `mqtt-broker`           | Broker host          |
//! | `MQTT_PORT`    | no       | `1883`                  | Broker port          |
//! | `CORS_ORIGINS` | no       | `http://localhost:5173` | Allowed origins      |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use canopy_bus::{MqttBus, MqttBusConfig, TelemetryBus};
use canopy_dashboard::config::DashboardConfig;
use canopy_dashboard::state::AppState;
use canopy_dashboard::{feed, routes};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CLIENT_ID: &str = "dashboard-service";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "canopy_dashboard=info,canopy_bus=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DashboardConfig::from_env();
    let cancel = CancellationToken::new();

    tracing::info!(
        broker = %config.mqtt_host,
        port = config.mqtt_port,
        "Starting canopy-dashboard",
    );

    let bus = MqttBus::connect(
        MqttBusConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: CLIENT_ID.to_owned(),
            retry: config.retry,
        },
        cancel.clone(),
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Could not reach the MQTT broker");
        std::process::exit(1);
    });
    let bus: Arc<dyn TelemetryBus> = Arc::new(bus);

    let (feed_tx, _) = broadcast::channel(feed::FEED_CAPACITY);
    feed::attach(bus.as_ref(), feed_tx.clone())
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Could not subscribe to the telemetry channels");
            std::process::exit(1);
        });

    let state = AppState {
        bus,
        feed: feed_tx,
    };

    let app = routes::router()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(build_cors_layer(&config))
        .with_state(state);

    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    cancel.cancel();
    tracing::info!("Dashboard stopped");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from configuration.
///
/// Panics at startup if any configured origin is invalid; a
/// misconfigured dashboard should fail fast rather than serve a
/// frontend that cannot talk to it.
fn build_cors_layer(config: &DashboardConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
}
