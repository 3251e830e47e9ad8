//! The authoritative catalog: business rules over an entity store.

use catalog_core::CatalogRpc;
use catalog_core::entity_store::{EntityStore, StoreError};
use catalog_core::error::CatalogError;
use catalog_core::record::{EntityKind, Record, RecordFields};
use futures::future::BoxFuture;
use tokio::sync::Mutex;

/// Catalog of one entity kind, backed by the store it owns.
///
/// Reads go straight to the store. Writes are serialized so that the
/// existence check of `create` and `update` and the following write happen
/// as one step.
pub struct CatalogService<S> {
    kind: EntityKind,
    store: S,
    writes: Mutex<()>,
}

impl<S: EntityStore> CatalogService<S> {
    /// Serve `kind` from `store`.
    pub fn new(kind: EntityKind, store: S) -> Self {
        Self {
            kind,
            store,
            writes: Mutex::new(()),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn internal(&self, error: &StoreError) -> CatalogError {
        tracing::error!(kind = %self.kind, error = %error, "Entity store failure");
        CatalogError::Internal(error.to_string())
    }

    /// Fetch `id`, or the kind's sentinel record when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Internal`] if the store fails.
    pub async fn lookup(&self, id: &str) -> Result<Record, CatalogError> {
        match self.store.get(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => {
                tracing::debug!(kind = %self.kind, id, "Lookup miss, returning sentinel");
                Ok(self.kind.sentinel(id))
            }
            Err(e) => Err(self.internal(&e)),
        }
    }

    /// Every record, or those whose title or description contains `query`
    /// (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Internal`] if the store fails.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Record>, CatalogError> {
        let records = self.store.iterate().await.map_err(|e| self.internal(&e))?;
        match query.filter(|q| !q.is_empty()) {
            None => Ok(records),
            Some(query) => {
                let needle = query.to_lowercase();
                Ok(records.into_iter().filter(|r| r.matches(&needle)).collect())
            }
        }
    }

    /// Persist a new record verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if a field is blank,
    /// [`CatalogError::AlreadyExists`] if the id is taken, or
    /// [`CatalogError::Internal`] if the store fails.
    pub async fn create(&self, record: Record) -> Result<Record, CatalogError> {
        record.validate()?;

        let _guard = self.writes.lock().await;
        if self
            .store
            .get(&record.id)
            .await
            .map_err(|e| self.internal(&e))?
            .is_some()
        {
            return Err(CatalogError::already_exists(self.kind, &record.id));
        }
        self.store
            .put(record.clone())
            .await
            .map_err(|e| self.internal(&e))?;

        tracing::info!(kind = %self.kind, id = %record.id, "Record created");
        Ok(record)
    }

    /// Merge `fields` over the stored record `id`; the id is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if the merge would blank a field,
    /// [`CatalogError::NotFound`] if `id` is absent, or
    /// [`CatalogError::Internal`] if the store fails.
    pub async fn update(&self, id: &str, fields: RecordFields) -> Result<Record, CatalogError> {
        fields.validate()?;

        let _guard = self.writes.lock().await;
        let existing = self
            .store
            .get(id)
            .await
            .map_err(|e| self.internal(&e))?
            .ok_or_else(|| CatalogError::not_found(self.kind, id))?;

        let updated = existing.merged(fields);
        self.store
            .put(updated.clone())
            .await
            .map_err(|e| self.internal(&e))?;

        tracing::info!(kind = %self.kind, id, "Record updated");
        Ok(updated)
    }

    /// Remove `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if `id` is absent, or
    /// [`CatalogError::Internal`] if the store fails.
    pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        let _guard = self.writes.lock().await;
        match self.store.delete(id).await {
            Ok(()) => {
                tracing::info!(kind = %self.kind, id, "Record deleted");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(CatalogError::not_found(self.kind, id)),
            Err(e) => Err(self.internal(&e)),
        }
    }
}

impl<S: EntityStore> CatalogRpc for CatalogService<S> {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn lookup(&self, id: &str) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let id = id.to_string();
        Box::pin(async move { Self::lookup(self, &id).await })
    }

    fn search(&self, query: Option<&str>) -> BoxFuture<'_, Result<Vec<Record>, CatalogError>> {
        let query = query.map(str::to_string);
        Box::pin(async move { Self::search(self, query.as_deref()).await })
    }

    fn create(&self, record: Record) -> BoxFuture<'_, Result<Record, CatalogError>> {
        Box::pin(Self::create(self, record))
    }

    fn update(&self, id: &str, fields: RecordFields) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let id = id.to_string();
        Box::pin(async move { Self::update(self, &id, fields).await })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), CatalogError>> {
        let id = id.to_string();
        Box::pin(async move { Self::delete(self, &id).await })
    }
}
