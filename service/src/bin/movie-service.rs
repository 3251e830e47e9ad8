//! Movie catalog service.
//!
//! # Usage
//!
//! ```bash
//! # Requires a Redpanda (or Kafka) broker, REDPANDA_BROKERS=localhost:9092 by default
//!
//! # Run service (RPC on :50051, consumes movies_topic)
//! cargo run --bin movie-service
//! ```

use catalog_core::record::EntityKind;
use catalog_service::{Config, app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env(EntityKind::Movie);
    tracing::info!(
        address = %config.bind_address(),
        store = %config.store_path().display(),
        redpanda = %config.redpanda.brokers,
        "Starting movie service"
    );

    app::run(config).await
}
