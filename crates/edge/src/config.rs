//! Environment configuration for the edge node.

use std::time::Duration;

use canopy_core::RetryPolicy;

/// Edge node configuration loaded from environment variables.
///
/// All fields have defaults suitable for the composed deployment;
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Identifier stamped on every reading and used as the MQTT client id.
    pub node_id: String,
    /// MQTT broker host.
    pub mqtt_host: String,
    /// MQTT broker port.
    pub mqtt_port: u16,
    /// Time between samples, shared by every sensor stream.
    pub sensor_interval: Duration,
    /// Startup connection retry policy.
    pub retry: RetryPolicy,
}

impl EdgeConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default       |
    /// |------------------------|---------------|
    /// | `NODE_ID`              | `edge-1`      |
    /// | `MQTT_BROKER`          | `mqtt-broker` |
    /// | `MQTT_PORT`            | `1883`        |
    /// | `SENSOR_INTERVAL_SECS` | `20`          |
    pub fn from_env() -> Self {
        let node_id = std::env::var("NODE_ID").unwrap_or_else(|_| "edge-1".into());
        let mqtt_host = std::env::var("MQTT_BROKER").unwrap_or_else(|_| "mqtt-broker".into());

        let mqtt_port: u16 = std::env::var("MQTT_PORT")
            .unwrap_or_else(|_| "1883".into())
            .parse()
            .expect("MQTT_PORT must be a valid u16");

        let interval_secs: u64 = std::env::var("SENSOR_INTERVAL_SECS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("SENSOR_INTERVAL_SECS must be a valid u64");

        Self {
            node_id,
            mqtt_host,
            mqtt_port,
            sensor_interval: Duration::from_secs(interval_secs),
            retry: RetryPolicy::default(),
        }
    }
}
