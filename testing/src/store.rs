//! In-memory entity store.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity

use catalog_core::entity_store::{EntityStore, StoreError};
use catalog_core::record::Record;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory entity store for fast, deterministic testing.
///
/// Iterates in id order. [`set_failing`](Self::set_failing) turns every call
/// into a [`StoreError::Io`] to exercise fault paths.
///
/// # Example
///
/// ```
/// use catalog_testing::InMemoryEntityStore;
/// use catalog_core::entity_store::EntityStore;
/// use catalog_core::record::Record;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEntityStore::new();
/// store.put(Record::new("1", "Dune", "Sci-fi epic")).await?;
/// assert!(store.get("1").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEntityStore {
    records: Arc<RwLock<BTreeMap<String, Record>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryEntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Io("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl EntityStore for InMemoryEntityStore {
    fn get(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, StoreError>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            self.check()?;
            Ok(self.records.read().unwrap().get(&id).cloned())
        })
    }

    fn iterate(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Record>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.check()?;
            Ok(self.records.read().unwrap().values().cloned().collect())
        })
    }

    fn put(&self, record: Record) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.check()?;
            self.records.write().unwrap().insert(record.id.clone(), record);
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            self.check()?;
            self.records
                .write()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or(StoreError::NotFound(id))
        })
    }
}
