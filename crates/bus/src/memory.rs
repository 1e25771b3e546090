//! Loopback bus for tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::matcher::topic_matches;
use crate::{BusError, BusMessage, MessageHandler, TelemetryBus};

// ---------------------------------------------------------------------------
// InMemoryBus
// ---------------------------------------------------------------------------

/// In-process [`TelemetryBus`] with inline dispatch.
///
/// `publish` runs every matching handler before returning and appends
/// the message to a journal, which keeps pipeline tests deterministic:
/// once a publish resolves, all downstream effects have happened.
#[derive(Default)]
pub struct InMemoryBus {
    subscriptions: RwLock<Vec<Subscription>>,
    journal: Mutex<Vec<BusMessage>>,
}

struct Subscription {
    filter: String,
    handler: Arc<dyn MessageHandler>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message published so far, in publish order.
    pub async fn published(&self) -> Vec<BusMessage> {
        self.journal.lock().await.clone()
    }

    /// Messages published to one exact topic.
    pub async fn published_to(&self, topic: &str) -> Vec<BusMessage> {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|message| message.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TelemetryBus for InMemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let message = BusMessage::new(topic, payload);
        self.journal.lock().await.push(message.clone());

        // Snapshot the matching handlers first so a handler is free to
        // publish again without deadlocking on the subscription lock.
        let handlers: Vec<Arc<dyn MessageHandler>> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .iter()
                .filter(|s| topic_matches(&s.filter, topic))
                .map(|s| Arc::clone(&s.handler))
                .collect()
        };

        for handler in handlers {
            if let Err(e) = handler.handle(message.clone()).await {
                tracing::warn!(error = %e, topic, "Message handler failed");
            }
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        self.subscriptions.write().await.push(Subscription {
            filter: filter.to_string(),
            handler,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
