//! Runtime components shared by catalog processes.
//!
//! - **`consumer`**: consumer-group loop with automatic resubscription
//! - **`handler`**: the trait a consumer dispatches each event to
//! - **`notifier`**: fire-and-forget publishing of write notifications
//! - **`retry`**: backoff policy used between resubscription attempts
//! - **`shutdown`**: Ctrl+C / SIGTERM future for graceful shutdown

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod consumer;
pub mod handler;
pub mod notifier;
pub mod retry;
pub mod shutdown;

pub use consumer::EventConsumer;
pub use handler::{EventHandler, HandlerError};
pub use notifier::Notifier;
pub use retry::RetryPolicy;
pub use shutdown::shutdown_signal;
