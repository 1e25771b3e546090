//! Environment configuration for the dashboard service.

use canopy_core::RetryPolicy;

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// HTTP bind address.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// MQTT broker host.
    pub mqtt_host: String,
    /// MQTT broker port.
    pub mqtt_port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Startup connection retry policy.
    pub retry: RetryPolicy,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var        | Default                 |
    /// |----------------|-------------------------|
    /// | `HOST`         | `0.0.0.0`               |
    /// | `PORT`         | `3000`                  |
    /// | `MQTT_BROKER`  | `mqtt-broker`           |
    /// | `MQTT_PORT`    | `1883`                  |
    /// | `CORS_ORIGINS` | `http://localhost:5173` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let mqtt_host = std::env::var("MQTT_BROKER").unwrap_or_else(|_| "mqtt-broker".into());

        let mqtt_port: u16 = std::env::var("MQTT_PORT")
            .unwrap_or_else(|_| "1883".into())
            .parse()
            .expect("MQTT_PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            mqtt_host,
            mqtt_port,
            cors_origins,
            retry: RetryPolicy::default(),
        }
    }
}
