//! Event bus abstraction for command and notification events.
//!
//! This module provides the [`EventBus`] trait for publishing and subscribing to
//! [`SerializedEvent`]s. Catalog services and the gateway publish notifications
//! after a committed write; each catalog service consumes its own topic through a
//! dedicated consumer group to apply deferred update and delete commands.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  1. Store       │
//! │   commit        │◄─── Source of truth
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ 2. Publish to   │
//! │    Event Bus    │◄─── Best effort, at-least-once
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Consumer group  │◄─── Replays from the earliest offset
//! │ (catalog svc)   │
//! └─────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - **Store first**: events describe writes that already committed
//! - **At-least-once delivery**: events may be delivered more than once
//! - **Idempotency**: subscribers must tolerate duplicates
//! - **Ordered within partition**: events keyed by the same record id keep order
//!
//! # Topic Naming Convention
//!
//! One topic per entity kind: `movies_topic`, `tvshows_topic`.
//!
//! # Implementations
//!
//! - `InMemoryEventBus` (in `catalog-testing`): retained log, for tests
//! - `RedpandaEventBus` (in `catalog-redpanda`): Kafka-compatible, for production

use crate::event::SerializedEvent;
use futures::Stream;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// Failed to connect to the event bus
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish an event to a topic
    #[error("Publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed
        topic: String,
        /// The reason for failure
        reason: String,
    },

    /// Failed to subscribe to topics
    #[error("Subscription failed for topics {topics:?}: {reason}")]
    SubscriptionFailed {
        /// The topics that failed to subscribe
        topics: Vec<String>,
        /// The reason for failure
        reason: String,
    },

    /// Failed to deserialize an event
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// One message handed to a subscriber.
///
/// The message counts as processed for the consumer group only once
/// [`ack`](Self::ack) is called. A delivery dropped without an ack is handed
/// out again to the next subscriber of the group.
pub struct Delivery {
    /// The delivered event.
    pub event: SerializedEvent,
    on_ack: Option<Box<dyn FnOnce() + Send>>,
}

impl Delivery {
    /// Wrap `event`, running `on_ack` when the subscriber acknowledges it.
    #[must_use]
    pub fn new(event: SerializedEvent, on_ack: impl FnOnce() + Send + 'static) -> Self {
        Self {
            event,
            on_ack: Some(Box::new(on_ack)),
        }
    }

    /// Mark the message as processed for the consumer group.
    pub fn ack(mut self) {
        if let Some(on_ack) = self.on_ack.take() {
            on_ack();
        }
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Stream of deliveries from a subscription.
///
/// Each item is a `Result`: a broken message surfaces as an error item and the
/// stream keeps going. Error items need no ack.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Delivery, EventBusError>> + Send>>;

/// Trait for event bus implementations.
///
/// # Delivery contract
///
/// - A consumer group that has never committed an offset starts from the
///   earliest retained message of each topic.
/// - A message is committed for the group only after the subscriber acked its
///   [`Delivery`], so a crash or shutdown may cause redelivery but never loss.
/// - Within one group, every message is delivered to one subscriber.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be shared as `Arc<dyn EventBus>` between the RPC path and the
/// consumer task.
pub trait EventBus: Send + Sync {
    /// Publish an event to a topic.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the publish operation fails.
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Join `consumer_group` on `topics` and receive a stream of events.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::SubscriptionFailed`] if subscription fails.
    fn subscribe(
        &self,
        consumer_group: &str,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_failed_display_names_topic() {
        let err = EventBusError::PublishFailed {
            topic: "movies_topic".to_string(),
            reason: "broker down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Publish failed for topic 'movies_topic': broker down"
        );
    }

    #[test]
    fn ack_runs_the_commit_once() {
        let acked = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&acked);
        let delivery = Delivery::new(
            SerializedEvent::new("PING".to_string(), serde_json::Value::Null),
            move || {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            },
        );

        assert_eq!(delivery.event.event_type, "PING");
        delivery.ack();
        assert_eq!(acked.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn event_bus_is_dyn_compatible() {
        fn assert_dyn(_: Option<&dyn EventBus>) {}
        assert_dyn(None);
    }
}
