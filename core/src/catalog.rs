//! The remote contract of a catalog service.
//!
//! [`CatalogRpc`] is implemented twice: by the service itself (the
//! authoritative implementation backed by an entity store) and by the RPC client
//! the gateway uses to reach it. REST handlers and GraphQL resolvers only ever
//! see this trait, which is what keeps both ingress surfaces equivalent.

use crate::error::CatalogError;
use crate::record::{EntityKind, Record, RecordFields};
use futures::future::BoxFuture;

/// Operations exposed by one catalog service.
pub trait CatalogRpc: Send + Sync {
    /// The entity kind this catalog serves.
    fn kind(&self) -> EntityKind;

    /// Fetch one record.
    ///
    /// A miss yields the kind's sentinel record, never [`CatalogError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Internal`] or [`CatalogError::Transport`] on
    /// faults.
    fn lookup(&self, id: &str) -> BoxFuture<'_, Result<Record, CatalogError>>;

    /// List records, optionally filtered by a case-insensitive substring of
    /// title or description. `None` or an empty query lists everything.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Internal`] or [`CatalogError::Transport`] on
    /// faults.
    fn search(&self, query: Option<&str>) -> BoxFuture<'_, Result<Vec<Record>, CatalogError>>;

    /// Persist a new record and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyExists`] if the id is taken, or
    /// [`CatalogError::Validation`] if a field is blank.
    fn create(&self, record: Record) -> BoxFuture<'_, Result<Record, CatalogError>>;

    /// Merge `fields` over the stored record and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is absent.
    fn update(&self, id: &str, fields: RecordFields) -> BoxFuture<'_, Result<Record, CatalogError>>;

    /// Remove a record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the id is absent.
    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), CatalogError>>;
}
