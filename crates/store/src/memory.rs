//! Journal-backed store for tests.

use async_trait::async_trait;
use canopy_core::Partition;
use tokio::sync::Mutex;

use crate::{StoreError, TelemetryDocument, TelemetryStore};

/// In-process [`TelemetryStore`] that keeps every inserted document.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<Vec<TelemetryDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every document inserted so far, in insert order.
    pub async fn documents(&self) -> Vec<TelemetryDocument> {
        self.documents.lock().await.clone()
    }

    /// Documents routed to one partition.
    pub async fn in_partition(&self, partition: Partition) -> Vec<TelemetryDocument> {
        self.documents
            .lock()
            .await
            .iter()
            .filter(|document| document.partition() == partition)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl TelemetryStore for InMemoryStore {
    async fn insert(&self, document: TelemetryDocument) -> Result<(), StoreError> {
        self.documents.lock().await.push(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn inserts_split_by_partition() {
        let store = InMemoryStore::new();

        store
            .insert(TelemetryDocument::new(
                "env/temperature/raw",
                json!({"sensor": "temperature", "value": 21.0}),
            ))
            .await
            .unwrap();
        store
            .insert(TelemetryDocument::new(
                "env/event/temperature_alert_high",
                json!({"sensor": "temperature", "value": 35.0, "event": true}),
            ))
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.in_partition(Partition::SensorReadings).await.len(), 1);

        let events = store.in_partition(Partition::Events).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic, "env/event/temperature_alert_high");
    }
}
