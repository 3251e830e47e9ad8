//! One catalog per entity kind, as seen by the gateway.

use crate::client::{ClientOptions, HttpCatalogClient, RpcError};
use catalog_core::CatalogRpc;
use catalog_core::error::CatalogError;
use catalog_core::record::EntityKind;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Routes each entity kind to the catalog that serves it.
///
/// Built once at startup. Every HTTP client created by
/// [`connect`](Self::connect) shares a single connection pool.
#[derive(Clone, Default)]
pub struct CatalogDirectory {
    catalogs: HashMap<EntityKind, Arc<dyn CatalogRpc>>,
}

impl CatalogDirectory {
    /// An empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP clients for every `(kind, address)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] if the HTTP client cannot be built or an address
    /// is invalid.
    pub fn connect<I, A>(addresses: I, options: &ClientOptions) -> Result<Self, RpcError>
    where
        I: IntoIterator<Item = (EntityKind, A)>,
        A: AsRef<str>,
    {
        let client = options.build_client()?;
        let mut directory = Self::new();
        for (kind, address) in addresses {
            let catalog = HttpCatalogClient::new(kind, client.clone(), address.as_ref())?;
            tracing::info!(%kind, url = catalog.base_url(), "Catalog client configured");
            directory = directory.with_catalog(Arc::new(catalog));
        }
        Ok(directory)
    }

    /// Register `catalog` under its own kind, replacing any previous entry.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogRpc>) -> Self {
        self.catalogs.insert(catalog.kind(), catalog);
        self
    }

    /// The catalog serving `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Transport`] if no catalog is registered for
    /// `kind`.
    pub fn get(&self, kind: EntityKind) -> Result<Arc<dyn CatalogRpc>, CatalogError> {
        self.catalogs.get(&kind).cloned().ok_or_else(|| {
            CatalogError::Transport(format!("no {} service configured", kind.label()))
        })
    }
}

impl fmt::Debug for CatalogDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.catalogs.keys().map(|kind| kind.tag()).collect();
        kinds.sort_unstable();
        f.debug_struct("CatalogDirectory").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn connect_registers_each_kind() {
        let directory = CatalogDirectory::connect(
            [
                (EntityKind::Movie, "127.0.0.1:50051"),
                (EntityKind::TvShow, "127.0.0.1:50052"),
            ],
            &ClientOptions::default(),
        )
        .unwrap();

        assert_eq!(directory.get(EntityKind::Movie).unwrap().kind(), EntityKind::Movie);
        assert_eq!(directory.get(EntityKind::TvShow).unwrap().kind(), EntityKind::TvShow);
    }

    #[test]
    fn debug_lists_registered_kinds() {
        let directory = CatalogDirectory::connect(
            [
                (EntityKind::TvShow, "127.0.0.1:50052"),
                (EntityKind::Movie, "127.0.0.1:50051"),
            ],
            &ClientOptions::default(),
        )
        .unwrap();

        assert_eq!(
            format!("{directory:?}"),
            r#"CatalogDirectory { kinds: ["MOVIE", "TVSHOW"] }"#
        );
    }

    #[test]
    fn missing_kind_is_a_transport_fault() {
        let directory = CatalogDirectory::new();
        let err = directory.get(EntityKind::TvShow).err().unwrap();
        assert_eq!(err, CatalogError::Transport("no TV show service configured".to_string()));
    }
}
