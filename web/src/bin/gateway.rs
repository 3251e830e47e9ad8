//! Catalog gateway.
//!
//! # Usage
//!
//! ```bash
//! # Start both catalog services first
//! cargo run --bin movie-service &
//! cargo run --bin tvshow-service &
//!
//! # Run gateway (REST + GraphQL on :3000)
//! cargo run --bin gateway
//! ```

use catalog_gateway::{Config, app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env();
    tracing::info!(
        address = %config.bind_address(),
        movies = %config.services.movie_addr,
        tvshows = %config.services.tvshow_addr,
        redpanda = %config.redpanda.brokers,
        "Starting catalog gateway"
    );

    app::run(config).await
}
