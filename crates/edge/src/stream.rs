//! One concurrently running sensor stream.
//!
//! Each stream owns its tick loop: sample, classify, publish. Streams
//! share nothing mutable except the [`SimulationCell`], so a failure
//! in one never stalls the others; a failed tick logs, backs off, and
//! resumes.

use std::sync::Arc;
use std::time::Duration;

use canopy_bus::{BusError, TelemetryBus};
use canopy_core::{topic, ConstraintSet, Reading, SensorKind, SimulationCell};
use tokio_util::sync::CancellationToken;

use crate::generator::ValueGenerator;

/// Pause after a failed tick before resuming the stream.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct SensorStream {
    node_id: String,
    kind: SensorKind,
    interval: Duration,
    bus: Arc<dyn TelemetryBus>,
    generator: Arc<dyn ValueGenerator>,
    constraints: Arc<ConstraintSet>,
    sim: Arc<SimulationCell>,
}

impl SensorStream {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_id: impl Into<String>,
        kind: SensorKind,
        interval: Duration,
        bus: Arc<dyn TelemetryBus>,
        generator: Arc<dyn ValueGenerator>,
        constraints: Arc<ConstraintSet>,
        sim: Arc<SimulationCell>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            interval,
            bus,
            generator,
            constraints,
            sim,
        }
    }

    /// Run the stream until `cancel` fires.
    ///
    /// The first sample is taken immediately, then one per interval.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            sensor = %self.kind,
            interval_secs = self.interval.as_secs(),
            "Sensor stream started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(sensor = %self.kind, "Sensor stream stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(
                            error = %e,
                            sensor = %self.kind,
                            "Sensor tick failed, backing off"
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }
    }

    /// Sample, classify, and publish one reading.
    ///
    /// Every reading goes to the raw channel; a violating reading goes
    /// to its event channel as well, byte-identical.
    pub async fn tick(&self) -> Result<(), BusError> {
        let mode = self.sim.load();
        let value = self.generator.sample(self.kind, mode);
        let verdict = self.constraints.evaluate(self.kind, value);
        let reading = Reading::new(self.node_id.as_str(), self.kind, value, verdict);

        let payload = serde_json::to_vec(&reading).expect("Reading is always serialisable");

        self.bus
            .publish(&topic::raw(self.kind), payload.clone())
            .await?;

        if let Some(event_kind) = reading.event_type {
            self.bus
                .publish(&topic::event(event_kind), payload)
                .await?;
            tracing::warn!(
                sensor = %self.kind,
                value,
                event_type = %event_kind,
                "Constraint violated"
            );
        } else {
            tracing::debug!(sensor = %self.kind, value, "Reading published");
        }

        Ok(())
    }
}
