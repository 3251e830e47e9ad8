//! Server side of the RPC contract.
//!
//! [`rpc_router`] turns any [`CatalogRpc`] into an axum router. Catalog
//! services mount it with their store-backed implementation; tests mount it
//! with whatever they need.

use crate::wire::{
    CreateRequest, Empty, Fault, IdRequest, RPC_PREFIX, RecordReply, RecordsReply, SearchRequest,
    UpdateRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use catalog_core::CatalogRpc;
use catalog_core::error::CatalogError;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

type Catalog = State<Arc<dyn CatalogRpc>>;

/// A [`CatalogError`] on its way back to the caller.
#[derive(Debug)]
pub struct FaultResponse(pub CatalogError);

impl FaultResponse {
    /// HTTP status for a fault.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::AlreadyExists(_) => StatusCode::CONFLICT,
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<CatalogError> for FaultResponse {
    fn from(error: CatalogError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for FaultResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self(CatalogError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for FaultResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "RPC failed");
        } else {
            tracing::debug!(code = self.0.code(), error = %self.0, "RPC rejected");
        }
        (status, Json(Fault::from(&self.0))).into_response()
    }
}

type RpcResult<T> = Result<Json<T>, FaultResponse>;

async fn lookup(
    State(catalog): Catalog,
    body: Result<Json<IdRequest>, JsonRejection>,
) -> RpcResult<RecordReply> {
    let Json(request) = body?;
    let record = catalog.lookup(&request.id).await?;
    Ok(Json(RecordReply { record }))
}

async fn search(
    State(catalog): Catalog,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> RpcResult<RecordsReply> {
    let Json(request) = body?;
    let records = catalog.search(request.query.as_deref()).await?;
    Ok(Json(RecordsReply { records }))
}

async fn create(
    State(catalog): Catalog,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> RpcResult<RecordReply> {
    let Json(request) = body?;
    let record = catalog.create(request.record).await?;
    Ok(Json(RecordReply { record }))
}

async fn update(
    State(catalog): Catalog,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> RpcResult<RecordReply> {
    let Json(request) = body?;
    let record = catalog.update(&request.id, request.patch).await?;
    Ok(Json(RecordReply { record }))
}

async fn delete(
    State(catalog): Catalog,
    body: Result<Json<IdRequest>, JsonRejection>,
) -> RpcResult<Empty> {
    let Json(request) = body?;
    catalog.delete(&request.id).await?;
    Ok(Json(Empty {}))
}

/// Build the router serving `catalog` under `/rpc`.
pub fn rpc_router(catalog: Arc<dyn CatalogRpc>) -> Router {
    let routes = Router::new()
        .route("/lookup", post(lookup))
        .route("/search", post(search))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete));

    Router::new()
        .nest(RPC_PREFIX, routes)
        .layer(TraceLayer::new_for_http())
        .with_state(catalog)
}

/// Serve `catalog` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the underlying I/O error if the server fails.
pub async fn serve(
    listener: tokio::net::TcpListener,
    catalog: Arc<dyn CatalogRpc>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(kind = %catalog.kind(), %addr, "Catalog RPC listening");
    }
    axum::serve(listener, rpc_router(catalog))
        .with_graceful_shutdown(shutdown)
        .await
}
