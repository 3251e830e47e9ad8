//! # Catalog Testing
//!
//! Testing utilities for the catalog gateway.
//!
//! This crate provides:
//! - [`InMemoryEntityStore`]: an entity store with optional fault injection
//! - [`InMemoryEventBus`]: a bus with retained per-topic logs and consumer
//!   group offsets, so replay and redelivery behave like Kafka
//! - [`FailingEventBus`]: a bus whose every operation fails
//! - [`fixtures`]: ready-made records
//!
//! ## Example
//!
//! ```ignore
//! use catalog_testing::{InMemoryEntityStore, InMemoryEventBus};
//!
//! #[tokio::test]
//! async fn create_publishes() {
//!     let bus = Arc::new(InMemoryEventBus::new());
//!     let store = Arc::new(InMemoryEntityStore::new());
//!     // wire a service, call it, then:
//!     let events = bus.wait_for_published("movies_topic", 1).await;
//!     assert_eq!(events[0].event_type, "MOVIE_CREATED");
//! }
//! ```

pub mod event_bus;
pub mod store;

/// Ready-made records for tests.
pub mod fixtures {
    use catalog_core::record::Record;

    /// `{id: "42", title: "Dune", description: "Sci-fi epic"}`
    #[must_use]
    pub fn dune() -> Record {
        Record::new("42", "Dune", "Sci-fi epic")
    }

    /// `{id: "7", title: "Alien", description: "Space horror"}`
    #[must_use]
    pub fn alien() -> Record {
        Record::new("7", "Alien", "Space horror")
    }

    /// A record of a TV show.
    #[must_use]
    pub fn the_wire() -> Record {
        Record::new("w1", "The Wire", "Baltimore crime drama")
    }
}

/// Install a test subscriber printing `tracing` output (once per process).
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

pub use event_bus::{FailingEventBus, InMemoryEventBus};
pub use store::InMemoryEntityStore;
