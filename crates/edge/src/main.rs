//! `canopy-edge` -- greenhouse edge telemetry node.
//!
//! Samples four simulated sensors concurrently, classifies each value
//! against its constraint locally, and publishes readings (plus any
//! violation events) over MQTT. Listens for simulate commands from the
//! dashboard on the control topic.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default       | Description                    |
//! |------------------------|----------|---------------|--------------------------------|
//! | `NODE_ID`              | no       | `edge-1`      | Identifier stamped on readings |
//! | `MQTT_BROKER`          | no       | `mqtt-broker` | Broker host                    |
//! | `MQTT_PORT`            | no       | `1883`        | Broker port                    |
//! | `SENSOR_INTERVAL_SECS` | no       | `20`          | Seconds between samples        |

use std::sync::Arc;

use canopy_bus::{MqttBus, MqttBusConfig};
use canopy_edge::config::EdgeConfig;
use canopy_edge::generator::SimulatedGenerator;
use canopy_edge::node::EdgeNode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canopy_edge=info,canopy_bus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EdgeConfig::from_env();
    let cancel = CancellationToken::new();

    tracing::info!(
        node = %config.node_id,
        broker = %config.mqtt_host,
        port = config.mqtt_port,
        interval_secs = config.sensor_interval.as_secs(),
        "Starting canopy-edge",
    );

    let bus = MqttBus::connect(
        MqttBusConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: config.node_id.clone(),
            retry: config.retry,
        },
        cancel.clone(),
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Could not reach the MQTT broker");
        std::process::exit(1);
    });

    let node = EdgeNode::start(
        &config,
        Arc::new(bus),
        Arc::new(SimulatedGenerator::new()),
        cancel.clone(),
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Edge node failed to start");
        std::process::exit(1);
    });

    shutdown_signal().await;
    cancel.cancel();
    node.join().await;
    tracing::info!("Edge node stopped");
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
