//! GraphQL surface of the gateway.
//!
//! ```graphql
//! type Query {
//!   movie(id: String!): Movie!
//!   movies: [Movie!]!
//!   tvShow(id: String!): TVShow!
//!   tvShows: [TVShow!]!
//! }
//!
//! type Mutation {
//!   createMovie(input: MovieInput!): Movie!
//!   createTVShow(input: TVShowInput!): TVShow!
//! }
//! ```
//!
//! Resolvers call the same [`AppState`] operations as the REST handlers. A
//! fault becomes an entry in `errors` carrying the catalog service's message
//! and an `extensions.code`; since every field is non-null, `data` is null.

use crate::state::AppState;
use async_graphql::http::GraphiQLSource;
use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Schema, SimpleObject,
};
use axum::{
    Json, Router,
    extract::State,
    response::Html,
    routing::get,
};
use catalog_core::error::CatalogError;
use catalog_core::event::Origin;
use catalog_core::record::{EntityKind, Record};

/// The gateway schema.
pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema over `state`.
#[must_use]
pub fn schema(state: AppState) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

/// `POST /graphql` and the GraphiQL page on `GET /graphql`.
#[must_use]
pub fn routes(schema: CatalogSchema) -> Router {
    Router::new()
        .route("/graphql", get(graphiql).post(execute))
        .with_state(schema)
}

async fn execute(
    State(schema): State<CatalogSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

#[allow(clippy::unused_async)]
async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// A movie.
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct Movie {
    id: String,
    title: String,
    description: String,
}

/// A TV show.
#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
#[graphql(name = "TVShow")]
pub struct TvShow {
    id: String,
    title: String,
    description: String,
}

/// Fields of a new movie.
#[derive(Debug, InputObject)]
pub struct MovieInput {
    id: String,
    title: String,
    description: String,
}

/// Fields of a new TV show.
#[derive(Debug, InputObject)]
#[graphql(name = "TVShowInput")]
pub struct TvShowInput {
    id: String,
    title: String,
    description: String,
}

impl From<Record> for Movie {
    fn from(r: Record) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
        }
    }
}

impl From<Record> for TvShow {
    fn from(r: Record) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
        }
    }
}

impl From<MovieInput> for Record {
    fn from(input: MovieInput) -> Self {
        Self::new(input.id, input.title, input.description)
    }
}

impl From<TvShowInput> for Record {
    fn from(input: TvShowInput) -> Self {
        Self::new(input.id, input.title, input.description)
    }
}

fn fault(err: CatalogError) -> async_graphql::Error {
    let code = err.code();
    tracing::warn!(code, error = %err, "GraphQL operation failed");
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

async fn lookup(ctx: &Context<'_>, kind: EntityKind, id: &str) -> async_graphql::Result<Record> {
    ctx.data::<AppState>()?.lookup(kind, id).await.map_err(fault)
}

async fn search(ctx: &Context<'_>, kind: EntityKind) -> async_graphql::Result<Vec<Record>> {
    ctx.data::<AppState>()?.search(kind).await.map_err(fault)
}

async fn create(ctx: &Context<'_>, kind: EntityKind, record: Record) -> async_graphql::Result<Record> {
    let created = ctx
        .data::<AppState>()?
        .create(kind, Origin::GraphQl, record)
        .await
        .map_err(fault)?;
    tracing::info!(%kind, id = %created.id, "Created via GraphQL");
    Ok(created)
}

/// Read operations.
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// One movie, or the not-found placeholder.
    async fn movie(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Movie> {
        lookup(ctx, EntityKind::Movie, &id).await.map(Movie::from)
    }

    /// Every movie.
    async fn movies(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<Movie>> {
        Ok(search(ctx, EntityKind::Movie)
            .await?
            .into_iter()
            .map(Movie::from)
            .collect())
    }

    /// One TV show, or the not-found placeholder.
    async fn tv_show(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<TvShow> {
        lookup(ctx, EntityKind::TvShow, &id).await.map(TvShow::from)
    }

    /// Every TV show.
    async fn tv_shows(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<TvShow>> {
        Ok(search(ctx, EntityKind::TvShow)
            .await?
            .into_iter()
            .map(TvShow::from)
            .collect())
    }
}

/// Write operations.
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Create a movie.
    async fn create_movie(
        &self,
        ctx: &Context<'_>,
        input: MovieInput,
    ) -> async_graphql::Result<Movie> {
        create(ctx, EntityKind::Movie, input.into()).await.map(Movie::from)
    }

    /// Create a TV show.
    #[graphql(name = "createTVShow")]
    async fn create_tv_show(
        &self,
        ctx: &Context<'_>,
        input: TvShowInput,
    ) -> async_graphql::Result<TvShow> {
        create(ctx, EntityKind::TvShow, input.into()).await.map(TvShow::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use catalog_core::CatalogRpc;
    use catalog_rpc::CatalogDirectory;
    use catalog_service::CatalogService;
    use catalog_testing::InMemoryEntityStore;
    use catalog_testing::fixtures::the_wire;
    use serde_json::json;
    use std::sync::Arc;

    fn test_schema() -> CatalogSchema {
        let tvshows: Arc<dyn CatalogRpc> = Arc::new(CatalogService::new(
            EntityKind::TvShow,
            InMemoryEntityStore::with_records([the_wire()]),
        ));
        schema(AppState::new(CatalogDirectory::new().with_catalog(tvshows)))
    }

    #[test]
    fn sdl_uses_the_public_names() {
        let sdl = test_schema().sdl();
        for needle in [
            "type TVShow",
            "input TVShowInput",
            "input MovieInput",
            "tvShow(id: String!): TVShow!",
            "tvShows: [TVShow!]!",
            "movies: [Movie!]!",
            "createTVShow(input: TVShowInput!): TVShow!",
            "createMovie(input: MovieInput!): Movie!",
        ] {
            assert!(sdl.contains(needle), "missing `{needle}` in:\n{sdl}");
        }
    }

    #[tokio::test]
    async fn tv_show_lookup_and_sentinel() {
        let schema = test_schema();
        let response = schema
            .execute(r#"{ hit: tvShow(id: "w1") { id title } miss: tvShow(id: "nope") { title } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "hit": { "id": "w1", "title": "The Wire" },
                "miss": { "title": "TV show not found" }
            })
        );
    }

    #[tokio::test]
    async fn faults_surface_as_errors_with_code() {
        let schema = test_schema();
        let response = schema
            .execute(
                r#"mutation { createTVShow(input: {id: "w1", title: "x", description: "y"}) { id } }"#,
            )
            .await;

        assert_eq!(response.data, async_graphql::Value::Null);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "TV show with id w1 already exists");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["errors"][0]["extensions"]["code"], "ALREADY_EXISTS");
    }

    #[tokio::test]
    async fn unreachable_kind_is_an_error() {
        let response = test_schema().execute("{ movies { id } }").await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.data, async_graphql::Value::Null);
    }
}
