//! REST endpoints of one catalog collection.
//!
//! ```text
//! GET  /movies       list every record         200 [Record]
//! GET  /movies/:id   one record or sentinel    200 Record
//! POST /movies       create                    201 {message, data}
//! ```
//!
//! Mirrored under `/tvshows`. Faults reported by the catalog service answer
//! 500 `{error, code}`; a body that is not JSON answers 400.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use catalog_core::event::Origin;
use catalog_core::record::{EntityKind, Record, RecordFields};
use serde::Serialize;

/// Routes of `kind`'s collection.
#[must_use]
pub fn routes(kind: EntityKind) -> Router<AppState> {
    let collection = format!("/{}", kind.collection());
    Router::new()
        .route(&collection, get(list).post(create))
        .route(&format!("{collection}/:id"), get(lookup))
        .layer(Extension(kind))
}

/// Reply to a successful create.
#[derive(Debug, Serialize)]
pub struct Created {
    /// Confirmation text ("Movie created successfully").
    pub message: String,
    /// The record as stored.
    pub data: Record,
}

/// `GET /{collection}`
///
/// # Errors
///
/// Returns a 500 [`AppError`] with the catalog service's fault.
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
) -> Result<Json<Vec<Record>>, AppError> {
    Ok(Json(state.search(kind).await?))
}

/// `GET /{collection}/:id`
///
/// # Errors
///
/// Returns a 500 [`AppError`] with the catalog service's fault.
pub async fn lookup(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    Ok(Json(state.lookup(kind, &id).await?))
}

/// `POST /{collection}`
///
/// Absent fields are sent as empty strings and left for the catalog service
/// to reject.
///
/// # Errors
///
/// Returns a 400 [`AppError`] if the body is not a JSON object, or a 500 with
/// the catalog service's fault.
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    body: Result<Json<RecordFields>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), AppError> {
    let Json(fields) = body?;
    let record = Record::new(
        fields.id.unwrap_or_default(),
        fields.title.unwrap_or_default(),
        fields.description.unwrap_or_default(),
    );

    let data = state.create(kind, Origin::Rest, record).await?;
    tracing::info!(%kind, id = %data.id, "Created via REST");

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: format!("{} created successfully", kind.label()),
            data,
        }),
    ))
}
