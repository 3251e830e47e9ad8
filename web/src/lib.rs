//! # Catalog Gateway
//!
//! One HTTP process in front of the movie and TV show catalog services,
//! accepting both REST and GraphQL.
//!
//! # Request Flow
//!
//! ```text
//! client ──► REST handler ─┐
//!                          ├─► AppState ──RPC──► catalog service
//! client ──► GraphQL ──────┘       │
//!                                  └─► <KIND>_CREATED_VIA_{REST,GRAPHQL}
//!                                      (spawned, best effort)
//! ```
//!
//! 1. **HTTP Request** arrives at a REST handler or the GraphQL endpoint
//! 2. **Resolve** the catalog service of the entity kind
//! 3. **Call** it over RPC and wait for the reply
//! 4. **Announce** a successful create on the bus, without waiting
//! 5. **Map** the reply (or fault) to the response
//!
//! # Example
//!
//! ```ignore
//! use catalog_gateway::{AppState, app};
//! use catalog_rpc::{CatalogDirectory, ClientOptions};
//!
//! let catalogs = CatalogDirectory::connect(
//!     [(EntityKind::Movie, "127.0.0.1:50051")],
//!     &ClientOptions::default(),
//! )?;
//! let app = app::router(AppState::new(catalogs));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod error;
pub mod graphql;
pub mod handlers;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the process-wide tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `info,catalog_*=debug`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,catalog_gateway=debug,catalog_runtime=debug,catalog_rpc=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
