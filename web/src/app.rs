//! Router assembly and process wiring of the gateway.

use crate::config::Config;
use crate::graphql;
use crate::handlers::{catalog, health_check};
use crate::state::AppState;
use axum::{Router, routing::get};
use catalog_core::event_bus::EventBus;
use catalog_core::record::EntityKind;
use catalog_redpanda::RedpandaEventBus;
use catalog_rpc::CatalogDirectory;
use catalog_runtime::{Notifier, shutdown_signal};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Every gateway route over `state`.
///
/// ```text
/// GET  /health
/// GET  /movies       GET /movies/:id      POST /movies
/// GET  /tvshows      GET /tvshows/:id     POST /tvshows
/// GET  /graphql      (GraphiQL)           POST /graphql
/// ```
#[must_use]
pub fn router(state: AppState) -> Router {
    let schema = graphql::schema(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .merge(catalog::routes(EntityKind::Movie))
        .merge(catalog::routes(EntityKind::TvShow))
        .with_state(state)
        .merge(graphql::routes(schema))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the gateway until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if a service address is invalid, the event bus cannot be
/// created, or the server cannot bind.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let catalogs = CatalogDirectory::connect(
        EntityKind::ALL.map(|kind| (kind, config.service_address(kind))),
        &config.client_options(),
    )?;

    info!(brokers = %config.redpanda.brokers, "Connecting to Redpanda event bus...");
    let event_bus: Arc<dyn EventBus> = Arc::new(
        RedpandaEventBus::builder()
            .brokers(&config.redpanda.brokers)
            .timeout(config.redpanda.publish_timeout)
            .build()?,
    );

    let state = EntityKind::ALL
        .into_iter()
        .fold(AppState::new(catalogs), |state, kind| {
            state.with_notifier(
                Notifier::new(Arc::clone(&event_bus), kind, config.topic(kind))
                    .with_timeout(config.redpanda.publish_timeout),
            )
        });

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    info!("REST: http://{addr}/movies, http://{addr}/tvshows");
    info!("GraphQL: http://{addr}/graphql");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}
