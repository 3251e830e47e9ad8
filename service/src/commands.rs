//! Asynchronous command intake.
//!
//! [`CommandHandler`] is the [`EventHandler`] a catalog service's consumer
//! group dispatches to. Update and delete requests are applied to the
//! catalog; everything else is logged and ignored. Delivery is at-least-once,
//! so a failed command (usually a record that is already gone) is logged and
//! dropped rather than retried. Applying a command never publishes.

use async_trait::async_trait;
use catalog_core::CatalogRpc;
use catalog_core::event::{CommandEvent, SerializedEvent};
use catalog_runtime::{EventHandler, HandlerError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies `*_UPDATE_REQUEST` and `*_DELETE_REQUEST` events to a catalog.
pub struct CommandHandler {
    catalog: Arc<dyn CatalogRpc>,
}

impl CommandHandler {
    /// Apply commands to `catalog`.
    ///
    /// Pass the store-backed catalog itself, not a notifying wrapper.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRpc>) -> Self {
        Self { catalog }
    }
}

fn applied(kind: &'static str, command: &'static str) {
    metrics::counter!("catalog_commands_applied_total", "kind" => kind, "command" => command)
        .increment(1);
}

fn rejected(kind: &'static str, command: &'static str) {
    metrics::counter!("catalog_commands_rejected_total", "kind" => kind, "command" => command)
        .increment(1);
}

#[async_trait]
impl EventHandler for CommandHandler {
    async fn handle(&self, event: &SerializedEvent) -> Result<(), HandlerError> {
        let kind = self.catalog.kind();
        let tag = kind.tag();

        let command = match CommandEvent::decode(kind, event) {
            Ok(command) => command,
            Err(e) => {
                rejected(tag, "malformed");
                return Err(Box::new(e));
            }
        };

        match command {
            CommandEvent::UpdateRequest { id, fields } => {
                match self.catalog.update(&id, fields).await {
                    Ok(record) => {
                        applied(tag, "update");
                        info!(%kind, id = %record.id, "Applied update request");
                    }
                    Err(e) => {
                        rejected(tag, "update");
                        warn!(%kind, %id, error = %e, "Dropped update request");
                    }
                }
            }
            CommandEvent::DeleteRequest { id } => match self.catalog.delete(&id).await {
                Ok(()) => {
                    applied(tag, "delete");
                    info!(%kind, %id, "Applied delete request");
                }
                Err(e) => {
                    rejected(tag, "delete");
                    warn!(%kind, %id, error = %e, "Dropped delete request");
                }
            },
            CommandEvent::Created { origin, data } => {
                debug!(%kind, ?origin, id = ?data.id, "Observed created notification");
            }
            CommandEvent::Unrecognized { event_type } => {
                info!(%kind, %event_type, "Unsupported message type");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::CatalogService;
    use catalog_core::record::{EntityKind, Record};
    use catalog_testing::InMemoryEntityStore;
    use catalog_testing::fixtures::{dune, the_wire};
    use serde_json::json;

    fn handler(
        kind: EntityKind,
        records: impl IntoIterator<Item = Record>,
    ) -> (CommandHandler, InMemoryEntityStore) {
        let store = InMemoryEntityStore::with_records(records);
        let service = Arc::new(CatalogService::new(kind, store.clone()));
        (CommandHandler::new(service), store)
    }

    fn event(event_type: &str, data: serde_json::Value) -> SerializedEvent {
        SerializedEvent::new(event_type.to_string(), data)
    }

    #[tokio::test]
    async fn update_request_merges_fields() {
        use catalog_core::entity_store::EntityStore;

        let (handler, store) = handler(EntityKind::Movie, [dune()]);
        handler
            .handle(&event("MOVIE_UPDATE_REQUEST", json!({ "id": "42", "title": "X" })))
            .await
            .unwrap();

        let stored = store.get("42").await.unwrap().unwrap();
        assert_eq!(stored, Record::new("42", "X", "Sci-fi epic"));
    }

    #[tokio::test]
    async fn repeated_delete_request_is_harmless() {
        let (handler, store) = handler(EntityKind::Movie, [dune()]);
        let delete = event("MOVIE_DELETE_REQUEST", json!({ "id": "42" }));

        handler.handle(&delete).await.unwrap();
        assert!(store.is_empty());
        handler.handle(&delete).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn other_types_are_ignored() {
        let (handler, store) = handler(EntityKind::TvShow, [the_wire()]);

        for t in [
            "TVSHOW_CREATED",
            "TVSHOW_CREATED_VIA_REST",
            "MOVIE_DELETE_REQUEST",
            "SOMETHING_ELSE",
        ] {
            handler.handle(&event(t, json!({ "id": "w1" }))).await.unwrap();
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn missing_id_is_reported() {
        let (handler, store) = handler(EntityKind::Movie, [dune()]);
        assert!(
            handler
                .handle(&event("MOVIE_DELETE_REQUEST", json!({})))
                .await
                .is_err()
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn blanking_update_is_dropped() {
        use catalog_core::entity_store::EntityStore;

        let (handler, store) = handler(EntityKind::Movie, [dune()]);
        handler
            .handle(&event("MOVIE_UPDATE_REQUEST", json!({ "id": "42", "description": "" })))
            .await
            .unwrap();
        assert_eq!(store.get("42").await.unwrap().unwrap(), dune());
    }
}
