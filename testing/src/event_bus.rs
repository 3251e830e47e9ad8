//! In-memory event buses.
//!
//! [`InMemoryEventBus`] keeps every published message in a per-topic log and
//! tracks a read position and a committed offset per `(consumer group, topic)`,
//! which gives the same observable semantics as a Kafka cluster with retention:
//!
//! - a new consumer group replays each topic from the beginning
//! - a group that resubscribes resumes after its last acked message
//! - a delivery dropped without an ack is handed out again on resubscribe

use catalog_core::event::SerializedEvent;
use catalog_core::event_bus::{Delivery, EventBus, EventBusError, EventStream};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

type GroupTopic = (String, String);

#[derive(Default)]
struct Log {
    topics: HashMap<String, Vec<SerializedEvent>>,
    positions: HashMap<GroupTopic, usize>,
    committed: HashMap<GroupTopic, usize>,
}

impl Log {
    /// Rewind `group` to its committed offsets, as a rebalance does.
    fn rewind(&mut self, group: &str, topics: &[String]) {
        for topic in topics {
            let key = (group.to_string(), topic.clone());
            let committed = self.committed.get(&key).copied().unwrap_or(0);
            self.positions.insert(key, committed);
        }
    }

    /// Take the next message at `group`'s read position, with its offset.
    fn next_for(
        &mut self,
        group: &str,
        topics: &[String],
    ) -> Option<(String, usize, SerializedEvent)> {
        for topic in topics {
            let Some(messages) = self.topics.get(topic) else {
                continue;
            };
            let position = self
                .positions
                .entry((group.to_string(), topic.clone()))
                .or_insert(0);
            if let Some(event) = messages.get(*position) {
                let offset = *position;
                *position += 1;
                return Some((topic.clone(), offset, event.clone()));
            }
        }
        None
    }

    fn commit(&mut self, key: GroupTopic, offset: usize) {
        let committed = self.committed.entry(key).or_insert(0);
        *committed = (*committed).max(offset + 1);
    }
}

/// Event bus backed by in-process retained logs.
///
/// # Example
///
/// ```
/// use catalog_testing::InMemoryEventBus;
/// use catalog_core::event::SerializedEvent;
/// use catalog_core::event_bus::EventBus;
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryEventBus::new();
/// let event = SerializedEvent::new("PING".to_string(), serde_json::Value::Null);
/// bus.publish("movies_topic", &event).await?;
///
/// let mut stream = bus.subscribe("group", &["movies_topic"]).await?;
/// let delivery = stream.next().await.transpose()?.ok_or("stream ended")?;
/// assert_eq!(delivery.event, event);
/// delivery.ack();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    log: Arc<Mutex<Log>>,
    notify: Arc<Notify>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message ever published to `topic`, in publish order.
    #[must_use]
    pub fn published(&self, topic: &str) -> Vec<SerializedEvent> {
        self.lock().topics.get(topic).cloned().unwrap_or_default()
    }

    /// Wait (up to two seconds) until `topic` holds at least `count` messages,
    /// then return them.
    ///
    /// Publishes are often spawned off the request path, so tests use this
    /// instead of reading [`published`](Self::published) right away.
    pub async fn wait_for_published(&self, topic: &str, count: usize) -> Vec<SerializedEvent> {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                let published = self.published(topic);
                if published.len() >= count {
                    return published;
                }
                notified.await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .unwrap_or_else(|_| self.published(topic))
    }

    /// Offset after the last message `group` acked on `topic`.
    #[must_use]
    pub fn committed(&self, group: &str, topic: &str) -> usize {
        self.lock()
            .committed
            .get(&(group.to_string(), topic.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();
        Box::pin(async move {
            self.lock().topics.entry(topic).or_default().push(event);
            self.notify.notify_waiters();
            Ok(())
        })
    }

    fn subscribe(
        &self,
        consumer_group: &str,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let group = consumer_group.to_string();
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();
        let log = Arc::clone(&self.log);
        let notify = Arc::clone(&self.notify);

        Box::pin(async move {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .rewind(&group, &topics);

            let stream = async_stream::stream! {
                loop {
                    let notified = notify.notified();
                    let next = log
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .next_for(&group, &topics);
                    match next {
                        Some((topic, offset, event)) => {
                            let log = Arc::clone(&log);
                            let key = (group.clone(), topic);
                            yield Ok(Delivery::new(event, move || {
                                log.lock()
                                    .unwrap_or_else(PoisonError::into_inner)
                                    .commit(key, offset);
                            }));
                        }
                        None => notified.await,
                    }
                }
                #[allow(unreachable_code)]
                ()
            };
            Ok(Box::pin(stream) as EventStream)
        })
    }
}

/// Event bus whose every publish and subscribe fails.
///
/// Used to prove that write paths treat notifications as best effort.
#[derive(Clone, Debug, Default)]
pub struct FailingEventBus;

impl EventBus for FailingEventBus {
    fn publish(
        &self,
        topic: &str,
        _event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            Err(EventBusError::PublishFailed {
                topic,
                reason: "broker unreachable".to_string(),
            })
        })
    }

    fn subscribe(
        &self,
        _consumer_group: &str,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(|s| (*s).to_string()).collect();
        Box::pin(async move {
            Err(EventBusError::SubscriptionFailed {
                topics,
                reason: "broker unreachable".to_string(),
            })
        })
    }
}
