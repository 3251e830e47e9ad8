//! Consumer-group loop with automatic resubscription.
//!
//! [`EventConsumer`] owns everything between the bus and an
//! [`EventHandler`]: joining the consumer group, feeding delivered events to
//! the handler one at a time, surviving handler and stream errors, and
//! resubscribing when the stream ends.
//!
//! # Pattern: Subscribe-Process-Reconnect Loop
//!
//! ```text
//! loop {
//!     subscribe(group, topics):
//!         for each event, in delivery order:
//!             handler.handle(event)   // errors logged, never fatal
//!             ack(event)              // commits the group offset
//!         stream ended → back off, resubscribe
//!     subscription failed → back off, retry
//! }                                   // until shutdown signal
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//!
//! let handle = EventConsumer::new(
//!     "movie-commands",
//!     "movie-service-group",
//!     vec!["movies_topic".to_string()],
//!     event_bus,
//!     handler,
//!     shutdown_rx,
//! )
//! .spawn();
//!
//! // Later
//! let _ = shutdown_tx.send(());
//! handle.await?;
//! ```

use crate::handler::EventHandler;
use crate::retry::RetryPolicy;
use catalog_core::event_bus::{EventBus, EventStream};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Why a processed stream stopped.
enum StreamOutcome {
    Ended,
    Shutdown,
}

/// Consumer for one consumer group.
///
/// # Lifecycle
///
/// 1. Created via [`new`](Self::new)
/// 2. Spawned as a background task via [`spawn`](Self::spawn)
/// 3. Runs until the shutdown signal fires (or its sender is dropped)
pub struct EventConsumer {
    /// Consumer name (for logging)
    name: String,

    /// Consumer group joined on every subscription
    consumer_group: String,

    /// Topics to subscribe to
    topics: Vec<String>,

    /// Event bus to consume from
    event_bus: Arc<dyn EventBus>,

    /// Handler for processing events
    handler: Arc<dyn EventHandler>,

    /// Shutdown signal receiver
    shutdown: broadcast::Receiver<()>,

    /// Backoff between resubscription attempts
    retry_policy: RetryPolicy,
}

impl EventConsumer {
    /// Create a new event consumer with the default [`RetryPolicy`].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        consumer_group: impl Into<String>,
        topics: Vec<String>,
        event_bus: Arc<dyn EventBus>,
        handler: Arc<dyn EventHandler>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            consumer_group: consumer_group.into(),
            topics,
            event_bus,
            handler,
            shutdown,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Set the backoff used between resubscription attempts.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Spawn the consumer as a background task.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the consumer on the current task until shutdown.
    pub async fn run(&mut self) {
        info!(
            consumer = %self.name,
            consumer_group = %self.consumer_group,
            topics = ?self.topics,
            "Event consumer started"
        );

        let mut attempt = 0;
        loop {
            let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();

            let subscribed = tokio::select! {
                _ = self.shutdown.recv() => break,
                result = self.event_bus.subscribe(&self.consumer_group, &topics) => result,
            };

            match subscribed {
                Ok(mut stream) => {
                    attempt = 0;
                    info!(consumer = %self.name, "Subscribed to event bus");
                    if let StreamOutcome::Shutdown = self.process_stream(&mut stream).await {
                        break;
                    }
                    warn!(consumer = %self.name, "Event stream ended");
                }
                Err(e) => {
                    error!(consumer = %self.name, error = %e, "Failed to subscribe to event bus");
                }
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            attempt += 1;
            debug!(consumer = %self.name, delay_ms = delay.as_millis(), "Resubscribing after delay");
            tokio::select! {
                _ = self.shutdown.recv() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!(consumer = %self.name, "Event consumer stopped");
    }

    /// Feed events to the handler, sequentially, until the stream ends or
    /// shutdown is signalled.
    ///
    /// An event is acked once its handler returned; shutdown is only observed
    /// between events.
    async fn process_stream(&mut self, stream: &mut EventStream) -> StreamOutcome {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.recv() => return StreamOutcome::Shutdown,
                next = stream.next() => match next {
                    Some(Ok(delivery)) => {
                        let event = &delivery.event;
                        debug!(
                            consumer = %self.name,
                            event_type = %event.event_type,
                            "Processing event"
                        );
                        if let Err(e) = self.handler.handle(event).await {
                            error!(
                                consumer = %self.name,
                                event_type = %event.event_type,
                                error = %e,
                                "Failed to handle event"
                            );
                        }
                        delivery.ack();
                    }
                    Some(Err(e)) => {
                        error!(consumer = %self.name, error = %e, "Error receiving event from stream");
                    }
                    None => return StreamOutcome::Ended,
                },
            }
        }
    }
}
