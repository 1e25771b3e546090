//! Integration tests for the edge pipeline: sensor streams, publish
//! fan-out, and control handling over an in-memory bus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use canopy_bus::{BusError, InMemoryBus, MessageHandler, TelemetryBus};
use canopy_core::{
    topic, ConstraintSet, RetryPolicy, SensorKind, SimulateCommand, SimulatePayload,
    SimulationCell, SimulationMode,
};
use canopy_edge::config::EdgeConfig;
use canopy_edge::generator::ValueGenerator;
use canopy_edge::node::EdgeNode;
use canopy_edge::stream::SensorStream;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Generator that always returns the same value.
struct FixedGenerator(f64);

impl ValueGenerator for FixedGenerator {
    fn sample(&self, _kind: SensorKind, _mode: SimulationMode) -> f64 {
        self.0
    }
}

/// Generator that records the simulation mode of every sample request.
#[derive(Default)]
struct RecordingGenerator {
    modes: Mutex<Vec<SimulationMode>>,
}

impl ValueGenerator for RecordingGenerator {
    fn sample(&self, _kind: SensorKind, mode: SimulationMode) -> f64 {
        self.modes.lock().unwrap().push(mode);
        20.0
    }
}

/// Bus that rejects every temperature publish.
struct FlakyBus {
    inner: InMemoryBus,
}

#[async_trait]
impl TelemetryBus for FlakyBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if topic.contains("temperature") {
            return Err(BusError::Handler("injected failure".to_string()));
        }
        self.inner.publish(topic, payload).await
    }

    async fn subscribe(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        self.inner.subscribe(filter, handler).await
    }
}

fn stream_for(kind: SensorKind, value: f64, bus: Arc<dyn TelemetryBus>) -> SensorStream {
    SensorStream::new(
        "test-node",
        kind,
        Duration::from_secs(60),
        bus,
        Arc::new(FixedGenerator(value)),
        Arc::new(ConstraintSet::default()),
        Arc::new(SimulationCell::new()),
    )
}

fn test_config(interval: Duration) -> EdgeConfig {
    EdgeConfig {
        node_id: "test-node".to_string(),
        mqtt_host: "unused".to_string(),
        mqtt_port: 1883,
        sensor_interval: interval,
        retry: RetryPolicy::immediate(1),
    }
}

// ---------------------------------------------------------------------------
// Single-tick behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_tick_publishes_on_the_raw_channel() {
    let bus = Arc::new(InMemoryBus::new());
    let stream = stream_for(SensorKind::Humidity, 55.0, bus.clone());

    stream.tick().await.unwrap();

    let raw = bus.published_to("env/humidity/raw").await;
    assert_eq!(raw.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&raw[0].payload).unwrap();
    assert_eq!(body["sensor"], "humidity");
    assert_eq!(body["value"], 55.0);
    assert_eq!(body["node"], "test-node");
    assert_eq!(body["event"], false);
    assert!(body["event_type"].is_null());

    // An admissible reading never reaches an event channel.
    assert_eq!(bus.published().await.len(), 1);
}

#[tokio::test]
async fn a_violation_fans_out_to_its_event_channel() {
    let bus = Arc::new(InMemoryBus::new());
    let stream = stream_for(SensorKind::Temperature, 36.0, bus.clone());

    stream.tick().await.unwrap();

    let raw = bus.published_to("env/temperature/raw").await;
    let events = bus.published_to("env/event/temperature_alert_high").await;
    assert_eq!(raw.len(), 1);
    assert_eq!(events.len(), 1);
    assert_eq!(raw[0].payload, events[0].payload);

    let body: serde_json::Value = serde_json::from_slice(&events[0].payload).unwrap();
    assert_eq!(body["event"], true);
    assert_eq!(body["event_type"], "temperature_alert_high");
}

#[tokio::test]
async fn boundary_values_stay_off_the_event_channel() {
    let bus = Arc::new(InMemoryBus::new());

    stream_for(SensorKind::Temperature, 30.0, bus.clone())
        .tick()
        .await
        .unwrap();
    stream_for(SensorKind::Light, 100.0, bus.clone())
        .tick()
        .await
        .unwrap();

    assert_eq!(bus.published().await.len(), 2);
    assert!(bus
        .published_to("env/event/temperature_alert_high")
        .await
        .is_empty());
    assert!(bus.published_to("env/event/light_low").await.is_empty());
}

#[tokio::test]
async fn a_failing_stream_does_not_block_its_siblings() {
    let bus = Arc::new(FlakyBus {
        inner: InMemoryBus::new(),
    });

    let failing = stream_for(SensorKind::Temperature, 20.0, bus.clone());
    assert!(failing.tick().await.is_err());

    let healthy = stream_for(SensorKind::Humidity, 55.0, bus.clone());
    healthy.tick().await.unwrap();

    assert_eq!(bus.inner.published_to("env/humidity/raw").await.len(), 1);
}

// ---------------------------------------------------------------------------
// Whole-node behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn node_runs_one_stream_per_sensor_kind() {
    let bus = Arc::new(InMemoryBus::new());
    let cancel = CancellationToken::new();
    let config = test_config(Duration::from_millis(5));

    let node = EdgeNode::start(
        &config,
        bus.clone(),
        Arc::new(FixedGenerator(20.0)),
        cancel.clone(),
    )
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    node.join().await;

    for kind in SensorKind::ALL {
        assert!(
            !bus.published_to(&topic::raw(kind)).await.is_empty(),
            "no samples for {kind}"
        );
    }
}

#[tokio::test]
async fn a_simulate_command_reaches_running_streams() {
    let bus = Arc::new(InMemoryBus::new());
    let cancel = CancellationToken::new();
    let generator = Arc::new(RecordingGenerator::default());
    let config = test_config(Duration::from_millis(5));

    let node = EdgeNode::start(&config, bus.clone(), generator.clone(), cancel.clone())
        .await
        .unwrap();

    // Let the streams take their first samples, then flip the mode.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let command = serde_json::to_vec(&SimulatePayload::new(SimulateCommand::Overheat)).unwrap();
    bus.publish(topic::CONTROL, command).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel.cancel();
    node.join().await;

    let modes = generator.modes.lock().unwrap();
    assert!(modes.contains(&SimulationMode::None));
    assert!(
        modes.contains(&SimulationMode::Overheat),
        "mode switch never reached the streams"
    );
}

#[tokio::test]
async fn malformed_control_messages_do_not_stop_the_node() {
    let bus = Arc::new(InMemoryBus::new());
    let cancel = CancellationToken::new();
    let config = test_config(Duration::from_millis(5));

    let node = EdgeNode::start(
        &config,
        bus.clone(),
        Arc::new(FixedGenerator(20.0)),
        cancel.clone(),
    )
    .await
    .unwrap();

    bus.publish(topic::CONTROL, b"not json".to_vec())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    cancel.cancel();
    node.join().await;

    assert!(!bus.published_to("env/temperature/raw").await.is_empty());
}
