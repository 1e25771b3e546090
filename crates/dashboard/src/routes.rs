//! HTTP route tree: health, the simulate control endpoint, and the
//! WebSocket feed.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use canopy_core::{topic, SimulateCommand, SimulatePayload, SimulationMode};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws;

/// Build the route tree.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/simulate", post(simulate))
        .route("/ws", get(ws::ws_handler))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Health check response payload.
#[derive(Serialize)]
struct HealthResponse {
    /// Overall service status.
    status: &'static str,
    /// Crate version from Cargo.toml.
    version: &'static str,
}

/// GET /health -- liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Simulate request acknowledgement.
#[derive(Debug, Serialize)]
struct SimulateResponse {
    status: &'static str,
    command: SimulateCommand,
}

/// POST /api/simulate -- forward a simulation command to the edge nodes.
///
/// The body is validated against the closed command set before anything
/// touches the bus; an unknown command is a 400, not a silent drop.
async fn simulate(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<SimulateResponse>> {
    let request: SimulatePayload = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("invalid simulate command: {e}")))?;

    // Re-stamp rather than trust the client's clock.
    let payload = SimulatePayload::new(request.command);
    let bytes = serde_json::to_vec(&payload).expect("SimulatePayload is always serialisable");
    state.bus.publish(topic::CONTROL, bytes).await?;

    tracing::info!(mode = %SimulationMode::from(request.command), "Simulate command forwarded");

    Ok(Json(SimulateResponse {
        status: "accepted",
        command: request.command,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use canopy_bus::InMemoryBus;
    use serde_json::json;
    use tokio::sync::broadcast;

    fn test_state() -> (Arc<InMemoryBus>, AppState) {
        let bus = Arc::new(InMemoryBus::new());
        let (feed, _) = broadcast::channel(8);
        let state = AppState {
            bus: bus.clone(),
            feed,
        };
        (bus, state)
    }

    #[tokio::test]
    async fn simulate_publishes_to_the_control_topic() {
        let (bus, state) = test_state();

        let Json(ack) = simulate(State(state), Json(json!({"type": "lowlight"})))
            .await
            .unwrap();
        assert_eq!(ack.status, "accepted");
        assert_eq!(ack.command, SimulateCommand::LowLight);

        let published = bus.published_to(topic::CONTROL).await;
        assert_eq!(published.len(), 1);

        let payload: SimulatePayload = serde_json::from_slice(&published[0].payload).unwrap();
        assert_eq!(payload.command, SimulateCommand::LowLight);
        assert!(payload.timestamp.is_some());
    }

    #[tokio::test]
    async fn unknown_commands_are_rejected() {
        let (bus, state) = test_state();

        let err = simulate(State(state), Json(json!({"type": "meltdown"})))
            .await
            .unwrap_err();
        assert_matches!(err, AppError::BadRequest(_));
        assert!(bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn a_body_without_a_command_is_rejected() {
        let (bus, state) = test_state();

        let err = simulate(State(state), Json(json!({})))
            .await
            .unwrap_err();
        assert_matches!(err, AppError::BadRequest(_));
        assert!(bus.published().await.is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }
}
