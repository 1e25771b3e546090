//! Integration tests for the logger: telemetry arriving over an
//! in-memory bus must land in the right store partition, and bad
//! messages must never stall the subscription.

use std::sync::Arc;

use async_trait::async_trait;
use canopy_bus::{InMemoryBus, TelemetryBus};
use canopy_core::{topic, Partition};
use canopy_logger::handler::RecordHandler;
use canopy_store::{InMemoryStore, StoreError, TelemetryDocument, TelemetryStore};
use serde_json::json;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Store that fails the first `failures_left` inserts, then delegates.
struct FlakyStore {
    inner: InMemoryStore,
    failures_left: Mutex<u32>,
}

impl FlakyStore {
    fn failing(failures: u32) -> Self {
        Self {
            inner: InMemoryStore::new(),
            failures_left: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl TelemetryStore for FlakyStore {
    async fn insert(&self, document: TelemetryDocument) -> Result<(), StoreError> {
        let mut failures_left = self.failures_left.lock().await;
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.inner.insert(document).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A wire-shape reading payload, as the edge node publishes it.
fn reading_json(sensor: &str, value: f64, event_type: Option<&str>) -> Vec<u8> {
    let body = json!({
        "sensor": sensor,
        "value": value,
        "timestamp": "2026-08-23T10:00:00Z",
        "node": "edge-1",
        "event": event_type.is_some(),
        "event_type": event_type,
    });
    serde_json::to_vec(&body).unwrap()
}

/// Bus with a [`RecordHandler`] subscribed to the full telemetry tree.
async fn logging_bus(store: Arc<dyn TelemetryStore>) -> InMemoryBus {
    let bus = InMemoryBus::new();
    bus.subscribe(
        topic::TELEMETRY_WILDCARD,
        Arc::new(RecordHandler::new(store)),
    )
    .await
    .unwrap();
    bus
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn raw_readings_land_in_the_readings_partition() {
    let store = Arc::new(InMemoryStore::new());
    let bus = logging_bus(store.clone()).await;

    bus.publish("env/temperature/raw", reading_json("temperature", 21.4, None))
        .await
        .unwrap();

    let readings = store.in_partition(Partition::SensorReadings).await;
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].topic, "env/temperature/raw");
    assert_eq!(readings[0].sensor(), Some("temperature"));
    assert_eq!(readings[0].value(), Some(21.4));
    assert_eq!(readings[0].node(), Some("edge-1"));
    assert!(store.in_partition(Partition::Events).await.is_empty());
}

#[tokio::test]
async fn event_messages_land_in_the_events_partition() {
    let store = Arc::new(InMemoryStore::new());
    let bus = logging_bus(store.clone()).await;

    bus.publish(
        "env/event/temperature_alert_high",
        reading_json("temperature", 33.0, Some("temperature_alert_high")),
    )
    .await
    .unwrap();

    let events = store.in_partition(Partition::Events).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, "env/event/temperature_alert_high");
    assert_eq!(events[0].body["event_type"], "temperature_alert_high");
    assert!(store.in_partition(Partition::SensorReadings).await.is_empty());
}

#[tokio::test]
async fn duplicate_payloads_are_stored_twice() {
    let store = Arc::new(InMemoryStore::new());
    let bus = logging_bus(store.clone()).await;

    let payload = reading_json("humidity", 55.0, None);
    bus.publish("env/humidity/raw", payload.clone())
        .await
        .unwrap();
    bus.publish("env/humidity/raw", payload).await.unwrap();

    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn undecodable_payloads_are_dropped_without_stalling() {
    let store = Arc::new(InMemoryStore::new());
    let bus = logging_bus(store.clone()).await;

    bus.publish("env/light/raw", b"not json at all".to_vec())
        .await
        .unwrap();
    bus.publish("env/light/raw", reading_json("light", 240.0, None))
        .await
        .unwrap();

    let documents = store.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].value(), Some(240.0));
}

#[tokio::test]
async fn a_store_failure_drops_only_that_message() {
    let store = Arc::new(FlakyStore::failing(1));
    let bus = logging_bus(store.clone()).await;

    bus.publish("env/airquality/raw", reading_json("airquality", 700.0, None))
        .await
        .unwrap();
    bus.publish("env/airquality/raw", reading_json("airquality", 800.0, None))
        .await
        .unwrap();

    let documents = store.inner.documents().await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].value(), Some(800.0));
}

#[tokio::test]
async fn control_traffic_is_not_persisted() {
    let store = Arc::new(InMemoryStore::new());
    let bus = logging_bus(store.clone()).await;

    bus.publish(topic::CONTROL, br#"{"type": "overheat"}"#.to_vec())
        .await
        .unwrap();

    assert!(store.is_empty().await);
}
