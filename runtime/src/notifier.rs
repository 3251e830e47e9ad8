//! Best-effort publishing of write notifications.
//!
//! A write is committed before anyone is told about it. The notification is
//! published on its own task with a timeout, and a failed publish is logged
//! and counted but never reaches the caller that made the write.

use catalog_core::event::CommandEvent;
use catalog_core::event_bus::{EventBus, EventBusError};
use catalog_core::record::EntityKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on a single publish.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Publishes [`CommandEvent`]s for one entity kind to its topic.
#[derive(Clone)]
pub struct Notifier {
    bus: Arc<dyn EventBus>,
    kind: EntityKind,
    topic: String,
    timeout: Duration,
}

impl Notifier {
    /// Notifier for `kind`, publishing to `topic`.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, kind: EntityKind, topic: impl Into<String>) -> Self {
        Self {
            bus,
            kind,
            topic: topic.into(),
            timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Override the publish timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Entity kind this notifier encodes for.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Encode and publish `command`, waiting for the bus to acknowledge.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the command cannot be
    /// encoded, the bus rejects it, or the publish exceeds the timeout.
    pub async fn publish(&self, command: &CommandEvent) -> Result<(), EventBusError> {
        let event = command
            .encode(self.kind)
            .map_err(|e| EventBusError::PublishFailed {
                topic: self.topic.clone(),
                reason: e.to_string(),
            })?;

        match tokio::time::timeout(self.timeout, self.bus.publish(&self.topic, &event)).await {
            Ok(result) => result,
            Err(_) => Err(EventBusError::PublishFailed {
                topic: self.topic.clone(),
                reason: format!("timed out after {}ms", self.timeout.as_millis()),
            }),
        }
    }

    /// Publish `command` on a background task.
    ///
    /// The returned handle may be dropped; tests await it to observe the
    /// outcome deterministically.
    pub fn notify(&self, command: CommandEvent) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            let event_type = command.event_type(notifier.kind);
            match notifier.publish(&command).await {
                Ok(()) => {
                    metrics::counter!(
                        "catalog_events_published_total",
                        "topic" => notifier.topic.clone()
                    )
                    .increment(1);
                    debug!(topic = %notifier.topic, event_type = %event_type, "Published notification");
                }
                Err(e) => {
                    metrics::counter!(
                        "catalog_publish_failures_total",
                        "topic" => notifier.topic.clone()
                    )
                    .increment(1);
                    warn!(
                        topic = %notifier.topic,
                        event_type = %event_type,
                        error = %e,
                        "Failed to publish notification"
                    );
                }
            }
        })
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("kind", &self.kind)
            .field("topic", &self.topic)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use catalog_core::event::Origin;
    use catalog_core::event_bus::EventStream;
    use catalog_core::event::SerializedEvent;
    use catalog_core::record::Record;
    use catalog_testing::{FailingEventBus, InMemoryEventBus};
    use std::future::Future;
    use std::pin::Pin;

    /// Bus whose publishes never complete.
    struct StalledEventBus;

    impl EventBus for StalledEventBus {
        fn publish(
            &self,
            _topic: &str,
            _event: &SerializedEvent,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
            Box::pin(futures::future::pending())
        }

        fn subscribe(
            &self,
            _consumer_group: &str,
            _topics: &[&str],
        ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
            Box::pin(futures::future::pending())
        }
    }

    #[tokio::test]
    async fn notify_publishes_encoded_event() {
        let bus = Arc::new(InMemoryEventBus::new());
        let notifier = Notifier::new(bus.clone(), EntityKind::Movie, "movies_topic");

        let record = Record::new("42", "Dune", "Sci-fi epic");
        notifier
            .notify(CommandEvent::created(Origin::Rest, record))
            .await
            .unwrap();

        let published = bus.published("movies_topic");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, "MOVIE_CREATED_VIA_REST");
        assert_eq!(published[0].data["title"], "Dune");
    }

    #[tokio::test]
    async fn failed_publish_is_swallowed_by_notify() {
        let notifier = Notifier::new(Arc::new(FailingEventBus), EntityKind::TvShow, "tvshows_topic");
        let command = CommandEvent::DeleteRequest { id: "w1".to_string() };

        assert!(notifier.publish(&command).await.is_err());
        // The spawned task completes normally even though the publish failed.
        notifier.notify(command).await.unwrap();
    }

    #[tokio::test]
    async fn publish_times_out() {
        let notifier = Notifier::new(Arc::new(StalledEventBus), EntityKind::Movie, "movies_topic")
            .with_timeout(Duration::from_millis(20));
        let command = CommandEvent::DeleteRequest { id: "42".to_string() };

        let err = notifier.publish(&command).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
