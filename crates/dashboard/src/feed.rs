//! Live telemetry feed.
//!
//! One bus handler subscribed to the raw and event channels pushes
//! every decoded message onto a broadcast channel; each WebSocket
//! connection holds its own receiver. Clients that fall behind lose
//! frames rather than slowing the feed down.

use std::sync::Arc;

use async_trait::async_trait;
use canopy_bus::{BusError, BusMessage, MessageHandler, TelemetryBus};
use canopy_core::topic;
use serde::Serialize;
use tokio::sync::broadcast;

/// Frames buffered per lagging client before frames are dropped.
pub const FEED_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Stream envelope
// ---------------------------------------------------------------------------

/// Which client-side stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Every reading, violating or not.
    SensorData,
    /// Constraint-violation events only.
    SensorEvent,
}

impl StreamKind {
    /// Classify a telemetry topic, `None` for traffic the dashboard
    /// does not render.
    pub fn for_topic(topic: &str) -> Option<Self> {
        if topic.contains("/raw") {
            Some(StreamKind::SensorData)
        } else if topic.contains("/event/") {
            Some(StreamKind::SensorEvent)
        } else {
            None
        }
    }
}

/// One frame pushed to every connected dashboard client.
///
/// Serializes to `{"stream": "...", "data": <payload as published>}`.
#[derive(Debug, Clone, Serialize)]
pub struct StreamFrame {
    pub stream: StreamKind,
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// FeedHandler
// ---------------------------------------------------------------------------

/// Bus handler that republishes telemetry onto the WebSocket feed.
pub struct FeedHandler {
    feed: broadcast::Sender<StreamFrame>,
}

impl FeedHandler {
    pub fn new(feed: broadcast::Sender<StreamFrame>) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl MessageHandler for FeedHandler {
    async fn handle(&self, message: BusMessage) -> Result<(), BusError> {
        let Some(stream) = StreamKind::for_topic(&message.topic) else {
            return Ok(());
        };

        let data: serde_json::Value = serde_json::from_slice(&message.payload)
            .map_err(|e| BusError::Handler(format!("undecodable payload: {e}")))?;

        if stream == StreamKind::SensorEvent {
            tracing::info!(
                event_type = data.get("event_type").and_then(|v| v.as_str()),
                node = data.get("node").and_then(|v| v.as_str()),
                "Violation event received",
            );
        }

        // A send error only means no client is connected right now.
        let _ = self.feed.send(StreamFrame { stream, data });
        Ok(())
    }
}

/// Subscribe the feed to the raw and event telemetry channels.
pub async fn attach(
    bus: &dyn TelemetryBus,
    feed: broadcast::Sender<StreamFrame>,
) -> Result<(), BusError> {
    let handler = Arc::new(FeedHandler::new(feed));
    bus.subscribe(topic::RAW_WILDCARD, handler.clone()).await?;
    bus.subscribe(topic::EVENT_WILDCARD, handler).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
