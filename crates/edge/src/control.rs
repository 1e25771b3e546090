//! Control-topic subscriber that switches the node's simulation mode.

use std::sync::Arc;

use async_trait::async_trait;
use canopy_bus::{BusError, BusMessage, MessageHandler};
use canopy_core::{SimulatePayload, SimulationCell, SimulationMode};

/// Applies simulate commands to the shared [`SimulationCell`].
///
/// A malformed payload is rejected without touching the cell, so the
/// previous mode stays in effect; the bus logs the rejection.
pub struct ControlHandler {
    node_id: String,
    sim: Arc<SimulationCell>,
}

impl ControlHandler {
    pub fn new(node_id: impl Into<String>, sim: Arc<SimulationCell>) -> Self {
        Self {
            node_id: node_id.into(),
            sim,
        }
    }
}

#[async_trait]
impl MessageHandler for ControlHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), BusError> {
        let payload: SimulatePayload = serde_json::from_slice(&message.payload)
            .map_err(|e| BusError::Handler(format!("malformed control payload: {e}")))?;

        let mode = SimulationMode::from(payload.command);
        self.sim.store(mode);
        tracing::info!(node = %self.node_id, mode = %mode, "Simulation mode updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
