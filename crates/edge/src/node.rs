//! Edge node assembly: the control subscription plus one stream per
//! sensor kind.

use std::sync::Arc;

use canopy_bus::{BusError, TelemetryBus};
use canopy_core::{topic, ConstraintSet, SensorKind, SimulationCell};
use tokio_util::sync::CancellationToken;

use crate::config::EdgeConfig;
use crate::control::ControlHandler;
use crate::generator::ValueGenerator;
use crate::stream::SensorStream;

/// A running edge node. Dropped handles keep running; use
/// [`EdgeNode::join`] after cancelling to wait for the streams.
pub struct EdgeNode {
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl EdgeNode {
    /// Subscribe to the control topic, then launch one stream per
    /// sensor kind.
    ///
    /// The control subscription is registered before any stream starts,
    /// so a simulate command can never race the first samples.
    pub async fn start(
        config: &EdgeConfig,
        bus: Arc<dyn TelemetryBus>,
        generator: Arc<dyn ValueGenerator>,
        cancel: CancellationToken,
    ) -> Result<Self, BusError> {
        let sim = Arc::new(SimulationCell::new());
        let constraints = Arc::new(ConstraintSet::default());

        let control = ControlHandler::new(config.node_id.as_str(), Arc::clone(&sim));
        bus.subscribe(topic::CONTROL, Arc::new(control)).await?;

        let mut handles = Vec::with_capacity(SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            let stream = SensorStream::new(
                config.node_id.as_str(),
                kind,
                config.sensor_interval,
                Arc::clone(&bus),
                Arc::clone(&generator),
                Arc::clone(&constraints),
                Arc::clone(&sim),
            );
            handles.push(tokio::spawn(stream.run(cancel.child_token())));
        }

        tracing::info!(
            node = %config.node_id,
            streams = handles.len(),
            "Edge node started"
        );
        Ok(Self { handles })
    }

    /// Wait for every stream to wind down after cancellation.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
