//! Event handler trait.
//!
//! The [`EventConsumer`](crate::EventConsumer) owns the subscription and hands
//! each delivered envelope to an [`EventHandler`]. Handlers decode the envelope
//! into whatever command type they understand and apply it.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//!
//! struct LogHandler;
//!
//! #[async_trait]
//! impl EventHandler for LogHandler {
//!     async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
//!         tracing::info!(event_type = %event.event_type, "Observed event");
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use catalog_core::event::SerializedEvent;

/// Error returned by a handler. Logged by the consumer, never fatal.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Handler for delivered events.
///
/// # Error Handling
///
/// An `Err` is logged by the consumer, which then moves on to the next event.
/// There is no retry and no dead-letter queue, so a handler that wants a
/// failure to be silent simply logs it and returns `Ok(())`.
///
/// # Idempotency
///
/// Delivery is at-least-once: the same event may reach `handle` twice.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Handle one delivered event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be processed.
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError>;
}
