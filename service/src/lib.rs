//! # Catalog Service
//!
//! The authoritative owner of one entity kind's records.
//!
//! A catalog service process serves two paths into the same store:
//!
//! ```text
//!  gateway ──RPC──► NotifyingCatalog ──► CatalogService ──► FileEntityStore
//!                         │                    ▲
//!                         ▼                    │
//!                   <KIND>_CREATED       CommandHandler ◄── consumer group
//!                   (best effort)        (update/delete requests)
//! ```
//!
//! - **`catalog`**: lookup/search/create/update/delete rules over a store
//! - **`notifying`**: publishes a notification after each synchronous write
//! - **`commands`**: applies update and delete requests delivered by the bus
//! - **`config`**: environment configuration of a service process
//! - **`demo`**: records seeded into an empty store
//! - **`app`**: process wiring shared by the `movie-service` and
//!   `tvshow-service` binaries

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod demo;
pub mod notifying;

pub use catalog::CatalogService;
pub use commands::CommandHandler;
pub use config::Config;
pub use notifying::NotifyingCatalog;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the process-wide tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `info,catalog_*=debug`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,catalog_service=debug,catalog_runtime=debug,catalog_rpc=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
