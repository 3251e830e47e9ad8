//! Entity store trait.
//!
//! The keyed persistence a catalog service owns: point reads, a full scan,
//! an unconditional upsert and a delete. Every catalog rule (id uniqueness,
//! merging, sentinels) lives above it in the service.
//!
//! # Implementations
//!
//! - `FileEntityStore` (in `catalog-store`): JSON file, for the services
//! - `InMemoryEntityStore` (in `catalog-testing`): for tests

use crate::record::Record;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during entity store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key does not exist (returned by `delete`).
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Reading or writing the backing storage failed.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// The backing storage holds data that cannot be decoded.
    #[error("Corrupt storage: {0}")]
    Corrupt(String),
}

/// Keyed persistent map from record id to record.
///
/// Iteration order is unspecified but stable within one process lifetime.
pub trait EntityStore: Send + Sync {
    /// Read one record. A miss is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Corrupt`] on storage faults.
    fn get(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Record>, StoreError>> + Send + '_>>;

    /// Read every record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Corrupt`] on storage faults.
    fn iterate(&self) -> Pin<Box<dyn Future<Output = Result<Vec<Record>, StoreError>> + Send + '_>>;

    /// Insert or replace the record under its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write cannot be persisted.
    fn put(&self, record: Record) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has this id.
    fn delete(&self, id: &str) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound("42".to_string());
        assert_eq!(err.to_string(), "Key not found: 42");
    }
}
