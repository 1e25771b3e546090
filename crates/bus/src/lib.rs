//! Publish/subscribe transport for the telemetry pipeline.
//!
//! Every service talks to the broker through the [`TelemetryBus`]
//! trait, so the transport can be swapped without touching pipeline
//! code:
//!
//! - [`MqttBus`] -- the production implementation, backed by `rumqttc`
//!   with bounded startup retry and automatic re-subscription after a
//!   broker reconnect.
//! - [`InMemoryBus`] -- a loopback implementation for tests; publishes
//!   are dispatched to matching handlers inline and journaled for
//!   assertions.
//!
//! Topic filters use MQTT semantics: `+` matches one level, a trailing
//! `#` matches the rest (see [`matcher::topic_matches`]).

use std::sync::Arc;

use async_trait::async_trait;

pub mod matcher;
pub mod memory;
pub mod mqtt;

pub use memory::InMemoryBus;
pub use mqtt::{MqttBus, MqttBusConfig};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Transport and dispatch failures surfaced by a [`TelemetryBus`].
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The broker never acknowledged a session within the retry budget.
    #[error("broker unreachable after {attempts} attempts")]
    Unreachable {
        attempts: u32,
        #[source]
        last: rumqttc::ConnectionError,
    },

    /// A publish or subscribe request could not be handed to the client.
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// A subscription handler rejected a delivered message.
    #[error("handler error: {0}")]
    Handler(String),

    /// Shutdown was requested while connecting.
    #[error("connect cancelled")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// Messages and handlers
// ---------------------------------------------------------------------------

/// A message delivered to subscription handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Receives every message matching a subscription's filter.
///
/// Errors are logged by the dispatching bus and never stop delivery to
/// other handlers or later messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: BusMessage) -> Result<(), BusError>;
}

// ---------------------------------------------------------------------------
// TelemetryBus
// ---------------------------------------------------------------------------

/// The pub/sub contract shared by all services.
#[async_trait]
pub trait TelemetryBus: Send + Sync {
    /// Fire-and-forget publish: the call returns once the message is
    /// handed to the transport, without waiting for consumers.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;

    /// Register `handler` for every message whose topic matches
    /// `filter`. Subscriptions last for the life of the bus.
    async fn subscribe(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError>;
}
