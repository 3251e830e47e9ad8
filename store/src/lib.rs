//! File-backed entity store for catalog services.
//!
//! This crate provides [`FileEntityStore`], the [`EntityStore`] a catalog
//! service persists its records with. Records live in a single JSON document
//! (`{"<id>": {record}, ...}`) that is loaded once on open and rewritten on
//! every mutation:
//!
//! - Writes go to a sibling `*.tmp` file which is then renamed over the
//!   document, so a crash never leaves a half-written file behind
//! - A single async lock serializes mutations; reads share the same lock and
//!   never touch the disk
//! - Iteration is in id order, which is stable for the lifetime of the process
//!
//! # Example
//!
//! ```no_run
//! use catalog_store::FileEntityStore;
//! use catalog_core::entity_store::EntityStore;
//! use catalog_core::record::Record;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileEntityStore::open("./data/movies.json").await?;
//! store.put(Record::new("1", "Dune", "Sci-fi epic")).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use catalog_core::entity_store::{EntityStore, StoreError};
use catalog_core::record::Record;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::sync::Mutex;

/// Entity store persisted as one JSON document.
pub struct FileEntityStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, Record>>,
}

impl FileEntityStore {
    /// Open (or create) the store at `path`.
    ///
    /// A missing file is an empty store; parent directories are created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Corrupt`] if it is not a JSON map of records.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Corrupt(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display()))),
        };

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Entity store opened"
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Insert `records` if the store holds nothing yet.
    ///
    /// Returns how many records were written (0 when the store was not empty).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the seeded document cannot be written.
    pub async fn seed_if_empty(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().await;
        if !guard.is_empty() {
            return Ok(0);
        }

        let mut next = BTreeMap::new();
        for record in records {
            next.insert(record.id.clone(), record);
        }
        let seeded = next.len();
        self.persist(&next).await?;
        *guard = next;

        tracing::info!(path = %self.path.display(), seeded, "Entity store seeded");
        Ok(seeded)
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &BTreeMap<String, Record>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Io(format!("failed to encode records: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))?;

        tracing::trace!(path = %self.path.display(), records = records.len(), "Entity store persisted");
        Ok(())
    }

    /// Apply `mutate` to a copy of the records, persist it, then publish it.
    ///
    /// The in-memory view only changes once the document is on disk.
    async fn commit<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, Record>) -> Result<(), StoreError> + Send,
    {
        let mut guard = self.records.lock().await;
        let mut next = guard.clone();
        mutate(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }
}

impl EntityStore for FileEntityStore {
    fn get(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, StoreError>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.records.lock().await.get(&id).cloned()) })
    }

    fn iterate(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Record>, StoreError>> + Send + '_>> {
        Box::pin(async move { Ok(self.records.lock().await.values().cloned().collect()) })
    }

    fn put(&self, record: Record) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.commit(|records| {
                records.insert(record.id.clone(), record);
                Ok(())
            })
            .await
        })
    }

    fn delete(&self, id: &str) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            self.commit(|records| {
                records
                    .remove(&id)
                    .map(|_| ())
                    .ok_or_else(|| StoreError::NotFound(id.clone()))
            })
            .await
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEntityStore::open(dir.path().join("movies.json")).await.unwrap();
        assert!(store.iterate().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("movies.json");

        let store = FileEntityStore::open(&path).await.unwrap();
        store.put(Record::new("2", "b", "b")).await.unwrap();
        store.put(Record::new("1", "a", "a")).await.unwrap();
        store.delete("2").await.unwrap();
        drop(store);

        let reopened = FileEntityStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.iterate().await.unwrap(),
            vec![Record::new("1", "a", "a")]
        );
    }

    #[tokio::test]
    async fn delete_missing_is_not_found_and_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEntityStore::open(dir.path().join("m.json")).await.unwrap();
        assert_eq!(
            store.delete("nope").await,
            Err(StoreError::NotFound("nope".to_string()))
        );
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, b"[1, 2").unwrap();
        assert!(matches!(
            FileEntityStore::open(&path).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEntityStore::open(dir.path().join("m.json")).await.unwrap();
        let seed = [Record::new("1", "a", "a"), Record::new("2", "b", "b")];

        assert_eq!(store.seed_if_empty(seed.clone()).await.unwrap(), 2);
        store.delete("1").await.unwrap();
        assert_eq!(store.seed_if_empty(seed).await.unwrap(), 0);
        assert_eq!(store.iterate().await.unwrap().len(), 1);
    }
}
