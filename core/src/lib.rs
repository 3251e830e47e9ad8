//! # Catalog Core
//!
//! Domain types and service seams shared by every process of the catalog
//! gateway: the movie and TV show catalog services, and the gateway that fronts
//! them with REST and GraphQL.
//!
//! ## Core Concepts
//!
//! - **Record**: an entity of the catalog (`id`, `title`, `description`),
//!   tagged by [`EntityKind`]
//! - **Entity store**: keyed persistence owned by exactly one catalog service
//!   ([`entity_store::EntityStore`])
//! - **Catalog RPC**: the remote contract of a catalog service
//!   ([`catalog::CatalogRpc`])
//! - **Command event**: the `{type, data}` message carried by the event bus
//!   ([`event::CommandEvent`])
//! - **Event bus**: durable publish/subscribe channel with consumer groups
//!   ([`event_bus::EventBus`])
//!
//! ## Write pipeline
//!
//! ```text
//!  REST / GraphQL ──► Gateway ──RPC──► Catalog service ──► Entity store
//!                        │                   │
//!                        └──(best effort)────┴──► Event bus ──► Consumer group
//!                                                               (update/delete)
//! ```
//!
//! A write is successful once the store commit succeeds. Publishing the
//! notification event never changes the outcome reported to the caller.

pub mod catalog;
pub mod entity_store;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod record;

// Re-export commonly used types
pub use catalog::CatalogRpc;
pub use entity_store::{EntityStore, StoreError};
pub use error::CatalogError;
pub use event::{CommandEvent, EventError, Origin, SerializedEvent};
pub use event_bus::{Delivery, EventBus, EventBusError, EventStream};
pub use record::{EntityKind, Record, RecordFields};
