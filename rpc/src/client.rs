//! Client side of the RPC contract.

use crate::wire::{
    CreateRequest, Empty, Fault, IdRequest, RPC_PREFIX, RecordReply, RecordsReply, SearchRequest,
    UpdateRequest,
};
use catalog_core::CatalogRpc;
use catalog_core::error::CatalogError;
use catalog_core::record::{EntityKind, Record, RecordFields};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while setting up a client. Call failures are
/// [`CatalogError`]s.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The service address is not a usable URL.
    #[error("invalid service address '{address}': {reason}")]
    InvalidAddress {
        /// The address as configured.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Timeouts applied to every call. There are no automatic retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on a whole call, connect included.
    pub timeout: Duration,
    /// Bound on establishing a connection.
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl ClientOptions {
    /// Build the pooled HTTP client these options describe.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Client`] if the TLS backend cannot be initialised.
    pub fn build_client(&self) -> Result<Client, RpcError> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| RpcError::Client(e.to_string()))
    }
}

/// [`CatalogRpc`] over HTTP, bound to one catalog service.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone, Debug)]
pub struct HttpCatalogClient {
    kind: EntityKind,
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Bind `client` to the `kind` service at `address`.
    ///
    /// `address` may be `host:port` or a full `http://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidAddress`] if `address` does not parse.
    pub fn new(kind: EntityKind, client: Client, address: &str) -> Result<Self, RpcError> {
        let invalid = |reason: String| RpcError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        let trimmed = address.trim();
        let url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let parsed = reqwest::Url::parse(&url).map_err(|e| invalid(e.to_string()))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }
        let base_url = url.trim_end_matches('/').to_string();

        Ok(Self {
            kind,
            client,
            base_url,
        })
    }

    /// Base URL calls are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, CatalogError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{RPC_PREFIX}/{operation}", self.base_url);
        let service = self.kind.label();

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(%url, error = %e, "RPC transport failure");
                if e.is_timeout() {
                    CatalogError::Transport(format!("{service} service timed out"))
                } else {
                    CatalogError::Transport(format!("{service} service unavailable: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Resp>().await.map_err(|e| {
                CatalogError::Transport(format!("unreadable reply from {service} service: {e}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<Fault>(&body) {
            Ok(fault) => Err(fault.into()),
            Err(_) => Err(CatalogError::Internal(format!(
                "{service} service replied {status}: {body}"
            ))),
        }
    }
}

impl CatalogRpc for HttpCatalogClient {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn lookup(&self, id: &str) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let request = IdRequest { id: id.to_string() };
        Box::pin(async move {
            let reply: RecordReply = self.call("lookup", &request).await?;
            Ok(reply.record)
        })
    }

    fn search(&self, query: Option<&str>) -> BoxFuture<'_, Result<Vec<Record>, CatalogError>> {
        let request = SearchRequest {
            query: query.map(str::to_string),
        };
        Box::pin(async move {
            let reply: RecordsReply = self.call("search", &request).await?;
            Ok(reply.records)
        })
    }

    fn create(&self, record: Record) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let request = CreateRequest { record };
        Box::pin(async move {
            let reply: RecordReply = self.call("create", &request).await?;
            Ok(reply.record)
        })
    }

    fn update(&self, id: &str, fields: RecordFields) -> BoxFuture<'_, Result<Record, CatalogError>> {
        let request = UpdateRequest {
            id: id.to_string(),
            patch: fields,
        };
        Box::pin(async move {
            let reply: RecordReply = self.call("update", &request).await?;
            Ok(reply.record)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, Result<(), CatalogError>> {
        let request = IdRequest { id: id.to_string() };
        Box::pin(async move {
            let _: Empty = self.call("delete", &request).await?;
            Ok(())
        })
    }
}
