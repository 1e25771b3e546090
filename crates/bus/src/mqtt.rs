//! `rumqttc`-backed implementation of [`TelemetryBus`].
//!
//! The client is lazy, so [`MqttBus::connect`] drives the event loop
//! itself until the broker acknowledges a session; startup therefore
//! fails loudly, within the retry budget, when the broker is absent.
//! After that a background task owns the event loop: it dispatches
//! publishes to subscribed handlers and renews every subscription when
//! the broker session is re-established.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canopy_core::RetryPolicy;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::matcher::topic_matches;
use crate::{BusError, BusMessage, MessageHandler, TelemetryBus};

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const EVENT_LOOP_CAPACITY: usize = 10;

/// Pause before re-polling after an event-loop error; the client
/// reconnects on the next poll.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection parameters for [`MqttBus::connect`].
#[derive(Debug, Clone)]
pub struct MqttBusConfig {
    pub host: String,
    pub port: u16,
    /// Stable client identifier presented to the broker.
    pub client_id: String,
    pub retry: RetryPolicy,
}

// ---------------------------------------------------------------------------
// MqttBus
// ---------------------------------------------------------------------------

struct Subscription {
    filter: String,
    handler: Arc<dyn MessageHandler>,
}

/// MQTT transport with inline handler dispatch.
pub struct MqttBus {
    client: AsyncClient,
    subscriptions: Arc<RwLock<Vec<Subscription>>>,
}

impl MqttBus {
    /// Connect to the broker, retrying per `config.retry`.
    ///
    /// Returns once a session is acknowledged. Cancelling `cancel`
    /// aborts the dial; after connect it stops the background event
    /// loop and disconnects.
    pub async fn connect(
        config: MqttBusConfig,
        cancel: CancellationToken,
    ) -> Result<Self, BusError> {
        let mut options =
            MqttOptions::new(config.client_id.as_str(), config.host.as_str(), config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut eventloop) = AsyncClient::new(options, EVENT_LOOP_CAPACITY);

        let mut attempt = 0u32;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(BusError::Cancelled),
                polled = eventloop.poll() => match polled {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!(
                            host = %config.host,
                            port = config.port,
                            client_id = %config.client_id,
                            "Connected to MQTT broker"
                        );
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        attempt += 1;
                        tracing::warn!(
                            error = %e,
                            attempt,
                            max_attempts = config.retry.max_attempts,
                            "MQTT connection attempt failed"
                        );
                        if attempt >= config.retry.max_attempts {
                            return Err(BusError::Unreachable {
                                attempts: attempt,
                                last: e,
                            });
                        }
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(BusError::Cancelled),
                            _ = tokio::time::sleep(config.retry.interval) => {}
                        }
                    }
                }
            }
        }

        let subscriptions: Arc<RwLock<Vec<Subscription>>> = Arc::default();
        tokio::spawn(drive(
            eventloop,
            client.clone(),
            Arc::clone(&subscriptions),
            cancel,
        ));

        Ok(Self {
            client,
            subscriptions,
        })
    }
}

#[async_trait]
impl TelemetryBus for MqttBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        filter: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), BusError> {
        {
            let mut subscriptions = self.subscriptions.write().await;
            subscriptions.push(Subscription {
                filter: filter.to_string(),
                handler,
            });
        }
        self.client.subscribe(filter, QoS::AtMostOnce).await?;
        tracing::debug!(filter, "Subscribed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

async fn drive(
    mut eventloop: EventLoop,
    client: AsyncClient,
    subscriptions: Arc<RwLock<Vec<Subscription>>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = client.disconnect().await;
                tracing::debug!("MQTT event loop stopped");
                return;
            }
            polled = eventloop.poll() => match polled {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = BusMessage::new(publish.topic, publish.payload.to_vec());
                    dispatch(&subscriptions, message).await;
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // A fresh session lost our filters; renew them all.
                    resubscribe(&client, &subscriptions).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "MQTT event loop error, reconnecting");
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = tokio::time::sleep(POLL_ERROR_PAUSE) => {}
                    }
                }
            }
        }
    }
}

async fn dispatch(subscriptions: &RwLock<Vec<Subscription>>, message: BusMessage) {
    // Snapshot the matching handlers first so no lock is held while
    // they run; a handler may subscribe, which needs the write lock.
    let handlers: Vec<Arc<dyn MessageHandler>> = {
        let subscriptions = subscriptions.read().await;
        subscriptions
            .iter()
            .filter(|s| topic_matches(&s.filter, &message.topic))
            .map(|s| Arc::clone(&s.handler))
            .collect()
    };

    for handler in handlers {
        if let Err(e) = handler.handle(message.clone()).await {
            tracing::warn!(error = %e, topic = %message.topic, "Message handler failed");
        }
    }
}

async fn resubscribe(client: &AsyncClient, subscriptions: &RwLock<Vec<Subscription>>) {
    // Copy the filters out; the registry lock is never held across an
    // await on the client.
    let filters: Vec<String> = {
        let subscriptions = subscriptions.read().await;
        subscriptions.iter().map(|s| s.filter.clone()).collect()
    };
    if filters.is_empty() {
        return;
    }
    for filter in &filters {
        if let Err(e) = client.subscribe(filter.clone(), QoS::AtMostOnce).await {
            tracing::warn!(error = %e, filter = %filter, "Re-subscribe failed");
        }
    }
    tracing::info!(
        filters = filters.len(),
        "Renewed subscriptions after reconnect"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl MessageHandler for NoopHandler {
        async fn handle(&self, _message: BusMessage) -> Result<(), BusError> {
            Ok(())
        }
    }

    /// Handler that registers a further subscription while handling.
    struct ReentrantSubscriber {
        subscriptions: Arc<RwLock<Vec<Subscription>>>,
    }

    #[async_trait]
    impl MessageHandler for ReentrantSubscriber {
        async fn handle(&self, _message: BusMessage) -> Result<(), BusError> {
            self.subscriptions.write().await.push(Subscription {
                filter: "env/event/#".to_string(),
                handler: Arc::new(NoopHandler),
            });
            Ok(())
        }
    }

    fn unreachable_config(retry: RetryPolicy) -> MqttBusConfig {
        // Port 1 is never a broker; connect attempts fail immediately.
        MqttBusConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            client_id: "test-client".to_string(),
            retry,
        }
    }

    #[tokio::test]
    async fn connect_gives_up_after_the_attempt_cap() {
        let config = unreachable_config(RetryPolicy::immediate(2));
        let err = match MqttBus::connect(config, CancellationToken::new()).await {
            Ok(_) => panic!("connect should fail without a broker"),
            Err(e) => e,
        };

        match err {
            BusError::Unreachable { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected Unreachable, got {other}"),
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_the_dial() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let config = unreachable_config(RetryPolicy::default());
        let result = MqttBus::connect(config, cancel).await;
        assert!(matches!(result, Err(BusError::Cancelled)));
    }

    #[tokio::test]
    async fn a_handler_may_subscribe_during_dispatch() {
        let subscriptions: Arc<RwLock<Vec<Subscription>>> = Arc::default();
        subscriptions.write().await.push(Subscription {
            filter: "env/#".to_string(),
            handler: Arc::new(ReentrantSubscriber {
                subscriptions: Arc::clone(&subscriptions),
            }),
        });

        let message = BusMessage::new("env/temperature/raw", b"21.4".to_vec());
        tokio::time::timeout(Duration::from_secs(1), dispatch(&subscriptions, message))
            .await
            .expect("dispatch stalled while a handler subscribed");

        assert_eq!(subscriptions.read().await.len(), 2);
    }
}
