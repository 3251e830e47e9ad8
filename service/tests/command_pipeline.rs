//! Bus to store: command events flowing through a consumer group into a
//! catalog service.

#![allow(clippy::unwrap_used)]

use catalog_core::CatalogRpc;
use catalog_core::event::{CommandEvent, SerializedEvent};
use catalog_core::event_bus::EventBus;
use catalog_core::record::{EntityKind, Record, RecordFields};
use catalog_runtime::{EventConsumer, Notifier, RetryPolicy};
use catalog_service::demo::demo_records;
use catalog_service::{CatalogService, CommandHandler, NotifyingCatalog};
use catalog_store::FileEntityStore;
use catalog_testing::InMemoryEventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const TOPIC: &str = "movies_topic";

struct Pipeline {
    bus: Arc<InMemoryEventBus>,
    catalog: Arc<dyn CatalogRpc>,
    shutdown: broadcast::Sender<()>,
    consumer: tokio::task::JoinHandle<()>,
}

impl Pipeline {
    fn start(catalog: Arc<dyn CatalogRpc>) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let (shutdown, rx) = broadcast::channel(1);
        let consumer = EventConsumer::new(
            "movie-commands",
            EntityKind::Movie.consumer_group(),
            vec![TOPIC.to_string()],
            bus.clone(),
            Arc::new(CommandHandler::new(catalog.clone())),
            rx,
        )
        .with_retry_policy(
            RetryPolicy::builder()
                .initial_delay(Duration::from_millis(10))
                .build(),
        )
        .spawn();

        Self {
            bus,
            catalog,
            shutdown,
            consumer,
        }
    }

    async fn send(&self, command: &CommandEvent) {
        let event = command.encode(EntityKind::Movie).unwrap();
        self.bus.publish(TOPIC, &event).await.unwrap();
    }

    /// Poll `lookup(id)` until `done` holds, for up to two seconds.
    async fn eventually(&self, id: &str, done: impl Fn(&Record) -> bool) -> Record {
        let poll = async {
            loop {
                let record = self.catalog.lookup(id).await.unwrap();
                if done(&record) {
                    return record;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), poll)
            .await
            .unwrap()
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), self.consumer)
            .await
            .unwrap()
            .unwrap();
    }
}

fn movie_service(records: impl IntoIterator<Item = Record>) -> Arc<dyn CatalogRpc> {
    Arc::new(CatalogService::new(
        EntityKind::Movie,
        catalog_testing::InMemoryEntityStore::with_records(records),
    ))
}

#[tokio::test]
async fn delete_request_leaves_sentinel_behind() {
    let pipeline = Pipeline::start(movie_service([Record::new("42", "Dune", "Sci-fi epic")]));

    pipeline
        .send(&CommandEvent::DeleteRequest { id: "42".to_string() })
        .await;

    let record = pipeline
        .eventually("42", |r| r.title == "Movie not found")
        .await;
    assert_eq!(record, EntityKind::Movie.sentinel("42"));
    pipeline.stop().await;
}

#[tokio::test]
async fn redelivered_commands_are_harmless() {
    let pipeline = Pipeline::start(movie_service([
        Record::new("1", "Alien", "Space horror"),
        Record::new("2", "Heat", "Crime"),
    ]));

    let update = CommandEvent::UpdateRequest {
        id: "1".to_string(),
        fields: RecordFields::default().with_title("Aliens"),
    };
    let delete = CommandEvent::DeleteRequest { id: "2".to_string() };
    for command in [&update, &update, &delete, &delete] {
        pipeline.send(command).await;
    }
    // Marker processed after everything above.
    pipeline
        .send(&CommandEvent::UpdateRequest {
            id: "1".to_string(),
            fields: RecordFields::default().with_description("Sequel"),
        })
        .await;

    let record = pipeline.eventually("1", |r| r.description == "Sequel").await;
    assert_eq!(record, Record::new("1", "Aliens", "Sequel"));
    assert_eq!(pipeline.catalog.search(None).await.unwrap(), vec![record]);
    pipeline.stop().await;
}

#[tokio::test]
async fn undecodable_and_foreign_events_do_not_stall_the_group() {
    let pipeline = Pipeline::start(movie_service([Record::new("7", "Up", "Balloons")]));

    for event in [
        SerializedEvent::new("MOVIE_DELETE_REQUEST".to_string(), serde_json::json!({})),
        SerializedEvent::new("MOVIE_UPDATE_REQUEST".to_string(), serde_json::json!("oops")),
        SerializedEvent::new("TVSHOW_DELETE_REQUEST".to_string(), serde_json::json!({ "id": "7" })),
        SerializedEvent::new("MOVIE_CREATED_VIA_REST".to_string(), serde_json::json!({ "id": "7" })),
    ] {
        pipeline.bus.publish(TOPIC, &event).await.unwrap();
    }
    pipeline
        .send(&CommandEvent::DeleteRequest { id: "7".to_string() })
        .await;

    pipeline
        .eventually("7", |r| r.title == "Movie not found")
        .await;
    pipeline.stop().await;
}

#[tokio::test]
async fn command_path_never_publishes() {
    let bus = Arc::new(InMemoryEventBus::new());
    let store_backed = movie_service([Record::new("42", "Dune", "Sci-fi epic")]);
    let rpc = NotifyingCatalog::new(
        store_backed.clone(),
        Notifier::new(bus.clone(), EntityKind::Movie, TOPIC),
    );

    let pipeline = Pipeline::start(store_backed);
    pipeline
        .send(&CommandEvent::UpdateRequest {
            id: "42".to_string(),
            fields: RecordFields::default().with_title("Dune: Part One"),
        })
        .await;
    pipeline
        .eventually("42", |r| r.title == "Dune: Part One")
        .await;

    // Only the RPC path announces writes.
    rpc.delete("42").await.unwrap();
    let published = bus.wait_for_published(TOPIC, 1).await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event_type, "MOVIE_CREATED");
    assert_eq!(pipeline.bus.published(TOPIC).len(), 1);
    pipeline.stop().await;
}

#[tokio::test]
async fn file_store_seeds_once_and_keeps_command_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("movies.json");

    {
        let store = FileEntityStore::open(&path).await.unwrap();
        assert_eq!(
            store
                .seed_if_empty(demo_records(EntityKind::Movie))
                .await
                .unwrap(),
            2
        );
        let pipeline = Pipeline::start(Arc::new(CatalogService::new(EntityKind::Movie, store)));
        pipeline
            .send(&CommandEvent::DeleteRequest { id: "1".to_string() })
            .await;
        pipeline
            .eventually("1", |r| r.title == "Movie not found")
            .await;
        pipeline.stop().await;
    }

    let reopened = FileEntityStore::open(&path).await.unwrap();
    assert_eq!(
        reopened
            .seed_if_empty(demo_records(EntityKind::Movie))
            .await
            .unwrap(),
        0
    );
    let service = CatalogService::new(EntityKind::Movie, reopened);
    let ids: Vec<_> = service
        .search(None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["2".to_string()]);
}
