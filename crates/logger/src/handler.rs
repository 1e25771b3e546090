//! Bus handler that persists every telemetry message it receives.
//!
//! - Decodes the payload as JSON and wraps it in a [`TelemetryDocument`].
//! - The document's topic decides the partition it lands in.
//! - Undecodable payloads and store failures are reported as handler
//!   errors; the bus logs them and keeps delivering.

use std::sync::Arc;

use async_trait::async_trait;
use canopy_bus::{BusError, BusMessage, MessageHandler};
use canopy_store::{TelemetryDocument, TelemetryStore};

/// Persists incoming bus messages into the document store.
pub struct RecordHandler {
    store: Arc<dyn TelemetryStore>,
}

impl RecordHandler {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MessageHandler for RecordHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), BusError> {
        let body: serde_json::Value = serde_json::from_slice(&message.payload)
            .map_err(|e| BusError::Handler(format!("undecodable payload: {e}")))?;

        let document = TelemetryDocument::new(message.topic.as_str(), body);
        let partition = document.partition();
        let sensor = document.sensor().map(str::to_owned);
        let node = document.node().map(str::to_owned);
        let value = document.value();

        self.store
            .insert(document)
            .await
            .map_err(|e| BusError::Handler(format!("store write failed: {e}")))?;

        tracing::info!(
            topic = %message.topic,
            partition = %partition,
            sensor = sensor.as_deref(),
            value,
            node = node.as_deref(),
            "Telemetry persisted"
        );

        Ok(())
    }
}
