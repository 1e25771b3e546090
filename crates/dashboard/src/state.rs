//! Shared application state.

use std::sync::Arc;

use canopy_bus::TelemetryBus;
use tokio::sync::broadcast;

use crate::feed::StreamFrame;

/// Shared state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; the inner data is behind `Arc` or is a channel
/// handle.
#[derive(Clone)]
pub struct AppState {
    /// Bus handle used to publish control commands.
    pub bus: Arc<dyn TelemetryBus>,
    /// Live telemetry fan-out feeding WebSocket connections.
    pub feed: broadcast::Sender<StreamFrame>,
}
