//! TV show catalog service.
//!
//! # Usage
//!
//! ```bash
//! # Run service (RPC on :50052, consumes tvshows_topic)
//! cargo run --bin tvshow-service
//! ```

use catalog_core::record::EntityKind;
use catalog_service::{Config, app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env(EntityKind::TvShow);
    tracing::info!(
        address = %config.bind_address(),
        store = %config.store_path().display(),
        redpanda = %config.redpanda.brokers,
        "Starting TV show service"
    );

    app::run(config).await
}
