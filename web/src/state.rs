//! Application state for Axum handlers and GraphQL resolvers.
//!
//! Both ingress surfaces go through [`AppState`], so a REST request and the
//! equivalent GraphQL operation reach the same catalog call and announce the
//! same record; only the origin recorded on the notification differs.

use catalog_core::CatalogRpc;
use catalog_core::error::CatalogError;
use catalog_core::event::{CommandEvent, Origin};
use catalog_core::record::{EntityKind, Record};
use catalog_rpc::CatalogDirectory;
use catalog_runtime::Notifier;
use std::collections::HashMap;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Owns no records; everything is delegated to the catalog services.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    catalogs: CatalogDirectory,
    notifiers: HashMap<EntityKind, Notifier>,
}

impl AppState {
    /// Create state routing to `catalogs`, with no notifications.
    #[must_use]
    pub fn new(catalogs: CatalogDirectory) -> Self {
        Self {
            catalogs,
            notifiers: HashMap::new(),
        }
    }

    /// Announce creations of `notifier.kind()` through `notifier`.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifiers.insert(notifier.kind(), notifier);
        self
    }

    fn catalog(&self, kind: EntityKind) -> Result<Arc<dyn CatalogRpc>, CatalogError> {
        self.catalogs.get(kind)
    }

    /// Fetch one record (the sentinel when it does not exist).
    ///
    /// # Errors
    ///
    /// Returns the fault reported by the catalog service.
    pub async fn lookup(&self, kind: EntityKind, id: &str) -> Result<Record, CatalogError> {
        self.catalog(kind)?.lookup(id).await
    }

    /// List every record of `kind`.
    ///
    /// # Errors
    ///
    /// Returns the fault reported by the catalog service.
    pub async fn search(&self, kind: EntityKind) -> Result<Vec<Record>, CatalogError> {
        self.catalog(kind)?.search(None).await
    }

    /// Create a record, then announce it as produced by `origin`.
    ///
    /// The announcement runs on its own task; its outcome never reaches the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns the fault reported by the catalog service. Nothing is
    /// announced in that case.
    pub async fn create(
        &self,
        kind: EntityKind,
        origin: Origin,
        record: Record,
    ) -> Result<Record, CatalogError> {
        let created = self.catalog(kind)?.create(record).await?;

        match self.notifiers.get(&kind) {
            Some(notifier) => {
                notifier.notify(CommandEvent::created(origin, created.clone()));
            }
            None => tracing::debug!(%kind, id = %created.id, "No notifier configured"),
        }
        Ok(created)
    }
}
