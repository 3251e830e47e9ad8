//! Property-based tests for catalog invariants.

#![allow(clippy::unwrap_used)]

use catalog_core::error::CatalogError;
use catalog_core::record::{EntityKind, Record, RecordFields};
use catalog_service::CatalogService;
use catalog_testing::InMemoryEntityStore;
use proptest::prelude::*;
use std::collections::BTreeMap;
use tokio_test::block_on;

fn arb_text() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,15}"
}

fn arb_record() -> impl Strategy<Value = Record> {
    ("[a-z0-9]{1,6}", arb_text(), arb_text())
        .prop_map(|(id, title, description)| Record::new(id, title, description))
}

fn service() -> CatalogService<InMemoryEntityStore> {
    CatalogService::new(EntityKind::Movie, InMemoryEntityStore::new())
}

proptest! {
    /// Every record created with a fresh id is listed exactly once.
    #[test]
    fn created_records_are_listed_once(records in prop::collection::vec(arb_record(), 1..20)) {
        block_on(async {
            let service = service();
            let mut accepted = BTreeMap::new();

            for record in records {
                let fresh = !accepted.contains_key(&record.id);
                let result = service.create(record.clone()).await;
                prop_assert_eq!(result.is_ok(), fresh);
                if fresh {
                    accepted.insert(record.id.clone(), record);
                }
            }

            let listed = service.search(Some("")).await.unwrap();
            prop_assert_eq!(listed.len(), accepted.len());
            for record in accepted.values() {
                prop_assert_eq!(listed.iter().filter(|r| *r == record).count(), 1);
            }
            Ok(())
        })?;
    }

    /// A duplicate create fails and leaves the stored record untouched.
    #[test]
    fn duplicate_create_changes_nothing(first in arb_record(), title in arb_text(), description in arb_text()) {
        block_on(async {
            let service = service();
            service.create(first.clone()).await.unwrap();

            let duplicate = Record::new(first.id.clone(), title, description);
            let err = service.create(duplicate).await.unwrap_err();
            prop_assert!(matches!(err, CatalogError::AlreadyExists(_)));
            prop_assert_eq!(service.lookup(&first.id).await.unwrap(), first);
            prop_assert_eq!(service.store().len(), 1);
            Ok(())
        })?;
    }

    /// Lookup of an absent id echoes the id in a sentinel.
    #[test]
    fn absent_lookup_returns_sentinel(id in "[a-z0-9]{1,12}") {
        block_on(async {
            let record = service().lookup(&id).await.unwrap();
            prop_assert_eq!(record, EntityKind::Movie.sentinel(id.clone()));
            Ok(())
        })?;
    }

    /// Updating only the title preserves id and description.
    #[test]
    fn title_update_preserves_other_fields(record in arb_record(), title in arb_text()) {
        block_on(async {
            let service = service();
            service.create(record.clone()).await.unwrap();

            let updated = service
                .update(&record.id, RecordFields::default().with_title(title.clone()))
                .await
                .unwrap();
            prop_assert_eq!(&updated.id, &record.id);
            prop_assert_eq!(&updated.title, &title);
            prop_assert_eq!(&updated.description, &record.description);
            Ok(())
        })?;
    }

    /// Search results are exactly the records matching the query.
    #[test]
    fn search_matches_title_or_description(
        records in prop::collection::vec(arb_record(), 0..10),
        query in "[A-Za-z]{1,3}",
    ) {
        block_on(async {
            let service = service();
            for record in records {
                let _ = service.create(record).await;
            }

            let needle = query.to_lowercase();
            let all = service.search(None).await.unwrap();
            let found = service.search(Some(query.to_uppercase().as_str())).await.unwrap();
            let expected: Vec<_> = all
                .into_iter()
                .filter(|r| {
                    r.title.to_lowercase().contains(&needle)
                        || r.description.to_lowercase().contains(&needle)
                })
                .collect();
            prop_assert_eq!(found, expected);
            Ok(())
        })?;
    }
}
