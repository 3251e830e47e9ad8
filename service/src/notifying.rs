//! The synchronous RPC path of a catalog service.
//!
//! [`NotifyingCatalog`] decorates a catalog so that every successful write
//! also publishes a `<KIND>_CREATED` notification carrying the resulting
//! record (or just `{id}` for a deletion). Publishing runs on its own task,
//! so the RPC reply never waits for the bus and never reflects its failures.

use catalog_core::CatalogRpc;
use catalog_core::error::CatalogError;
use catalog_core::event::{CommandEvent, Origin};
use catalog_core::record::{EntityKind, Record, RecordFields};
use catalog_runtime::Notifier;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Catalog that announces its committed writes.
pub struct NotifyingCatalog {
    inner: Arc<dyn CatalogRpc>,
    notifier: Notifier,
}

impl NotifyingCatalog {
    /// Wrap `inner`, publishing through `notifier`.
    #[must_use]
    pub fn new(inner: Arc<dyn CatalogRpc>, notifier: Notifier) -> Self {
        Self { inner, notifier }
    }

    fn announce(&self, data: RecordFields) {
        // Detached; the handle is not awaited.
        self.notifier.notify(CommandEvent::Created {
            origin: Origin::Service,
            data,
        });
    }
}

impl CatalogRpc for NotifyingCatalog {
    fn kind(&self) -> EntityKind {
        self.inner.kind()
    }

    fn lookup(&self, id: &str) -> BoxFuture<'_, Result<Record, CatalogError>> {
        self.inner.lookup(id)
    }

    fn search(&self, query: Option<&str>) -> BoxFuture<'_, Result<Vec<Record>, CatalogError>> {
        self.inner.search(query)
    }

    fn create(&self, record: Record) -> BoxFuture<'_, Result<Record, CatalogError>> {
        Box::pin(async move {
            let created = self.inner.create(record).await?;
            self.announce(created.clone().into());
            Ok(created)
        })
    }

    fn update(&self, id: &str, fields: RecordFields) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let id = id.to_string();
        Box::pin(async move {
            let updated = self.inner.update(&id, fields).await?;
            self.announce(updated.clone().into());
            Ok(updated)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), CatalogError>> {
        let id = id.to_string();
        Box::pin(async move {
            self.inner.delete(&id).await?;
            self.announce(RecordFields::id(id));
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::CatalogService;
    use catalog_core::event_bus::EventBus;
    use catalog_testing::fixtures::dune;
    use catalog_testing::{FailingEventBus, InMemoryEntityStore, InMemoryEventBus};

    fn notifying(bus: Arc<dyn EventBus>) -> NotifyingCatalog {
        let service = Arc::new(CatalogService::new(
            EntityKind::Movie,
            InMemoryEntityStore::new(),
        ));
        NotifyingCatalog::new(service, Notifier::new(bus, EntityKind::Movie, "movies_topic"))
    }

    #[tokio::test]
    async fn writes_publish_created_notifications() {
        let bus = Arc::new(InMemoryEventBus::new());
        let catalog = notifying(bus.clone());

        catalog.create(dune()).await.unwrap();
        catalog
            .update("42", RecordFields::default().with_title("X"))
            .await
            .unwrap();
        catalog.delete("42").await.unwrap();

        let events = bus.wait_for_published("movies_topic", 3).await;
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.event_type == "MOVIE_CREATED"));
        let ids: Vec<_> = events.iter().map(|e| e.data["id"].clone()).collect();
        assert!(ids.iter().all(|id| id == "42"));
        assert!(
            events
                .iter()
                .any(|e| e.data == serde_json::json!({ "id": "42" }))
        );
    }

    #[tokio::test]
    async fn failed_writes_publish_nothing() {
        let bus = Arc::new(InMemoryEventBus::new());
        let catalog = notifying(bus.clone());

        assert!(catalog.delete("missing").await.is_err());
        assert!(catalog.create(Record::new("1", "", "d")).await.is_err());
        assert!(catalog.lookup("1").await.is_ok());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(bus.published("movies_topic").is_empty());
    }

    #[tokio::test]
    async fn failing_bus_does_not_fail_writes() {
        let catalog = notifying(Arc::new(FailingEventBus));
        assert_eq!(catalog.create(dune()).await.unwrap(), dune());
        assert_eq!(catalog.lookup("42").await.unwrap(), dune());
    }
}
