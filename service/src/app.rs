//! Wiring of a catalog service process.

use crate::catalog::CatalogService;
use crate::commands::CommandHandler;
use crate::config::Config;
use crate::demo::demo_records;
use crate::notifying::NotifyingCatalog;
use catalog_core::CatalogRpc;
use catalog_core::event_bus::EventBus;
use catalog_redpanda::RedpandaEventBus;
use catalog_runtime::{EventConsumer, Notifier, RetryPolicy, shutdown_signal};
use catalog_store::FileEntityStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Run a catalog service until Ctrl+C or SIGTERM.
///
/// 1. Open the store (seeding demo records when enabled and empty)
/// 2. Start the command consumer on the service's consumer group
/// 3. Serve RPC, publishing a notification after every committed write
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the event bus cannot be
/// created, or the RPC server cannot bind.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let kind = config.kind;

    let store = FileEntityStore::open(config.store_path()).await?;
    if config.store.seed_demo_data {
        store.seed_if_empty(demo_records(kind)).await?;
    }
    let service: Arc<dyn CatalogRpc> = Arc::new(CatalogService::new(kind, store));

    info!(brokers = %config.redpanda.brokers, "Connecting to Redpanda event bus...");
    let event_bus: Arc<dyn EventBus> = Arc::new(
        RedpandaEventBus::builder()
            .brokers(&config.redpanda.brokers)
            .timeout(config.redpanda.publish_timeout)
            .build()?,
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let consumer = EventConsumer::new(
        format!("{kind}-commands"),
        config.redpanda.consumer_group.clone(),
        vec![config.redpanda.topic.clone()],
        Arc::clone(&event_bus),
        Arc::new(CommandHandler::new(Arc::clone(&service))),
        shutdown_rx,
    )
    .with_retry_policy(
        RetryPolicy::builder()
            .initial_delay(config.redpanda.consumer_retry_delay)
            .build(),
    )
    .spawn();

    let notifier = Notifier::new(event_bus, kind, config.redpanda.topic.clone())
        .with_timeout(config.redpanda.publish_timeout);
    let rpc: Arc<dyn CatalogRpc> = Arc::new(NotifyingCatalog::new(service, notifier));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    catalog_rpc::serve(listener, rpc, shutdown_signal()).await?;

    let _ = shutdown_tx.send(());
    if let Err(e) = consumer.await {
        tracing::warn!(error = %e, "Command consumer task failed");
    }

    info!(%kind, "Catalog service stopped");
    Ok(())
}
