//! End-to-end tests of the model layer over the in-memory driver.

use bson::{Bson, doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docmodel::{memory::MemoryDriver, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Kitten {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    lives: i32,
}

impl Kitten {
    fn new(name: &str, lives: i32) -> Self {
        Self { id: None, name: name.to_string(), lives }
    }
}

impl Model for Kitten {
    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn collection_name() -> &'static str {
        "kittens"
    }

    fn schema() -> Schema {
        Schema::new()
            .field("name", FieldRule::required(FieldType::String).with_min_len(1))
            .field("lives", FieldRule::required(FieldType::Int))
            .field("adopted_at", FieldRule::optional(FieldType::DateTime))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Adoption {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    kitten: String,
    adopted_at: bson::DateTime,
}

impl Model for Adoption {
    fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    fn collection_name() -> &'static str {
        "adoptions"
    }
}

#[tokio::test]
async fn insert_find_update_delete_roundtrip() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let ren = kittens.insert_one(Kitten::new("Ren", 9)).await.unwrap();
    let id = ren.id.expect("insert assigns identity");

    let found = kittens.find_by_id(&id.to_hex()).await.unwrap().unwrap();
    assert_eq!(found.name, "Ren");
    assert_eq!(found.lives, 9);

    let updated = kittens
        .find_by_id_and_update(
            &id.to_hex(),
            doc! { "$inc": { "lives": -1 } },
            UpdateOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.lives, 8);

    let deleted = kittens.find_by_id_and_delete(&id.to_hex()).await.unwrap().unwrap();
    assert_eq!(deleted.id, Some(id));
    assert_eq!(kittens.count(doc! {}).await.unwrap(), 0);

    store.shutdown().await.unwrap();
}

#[tokio::test]
async fn insert_many_echoes_instances_in_order() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let inserted = kittens
        .insert_many(vec![Kitten::new("Ren", 9), Kitten::new("Stimpy", 7)])
        .await
        .unwrap();

    assert_eq!(inserted.len(), 2);
    assert_eq!(inserted[0].name, "Ren");
    assert_eq!(inserted[1].name, "Stimpy");
    assert!(inserted.iter().all(|kitten| kitten.id.is_some()));
}

#[tokio::test]
async fn find_one_and_update_miss_is_none_not_an_error() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let result = kittens
        .find_one_and_update(
            doc! { "name": "Sven" },
            doc! { "$set": { "lives": 1 } },
            UpdateOptions::default(),
        )
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn malformed_id_is_rejected_without_touching_the_store() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let result = kittens.find_by_id("54321").await;
    assert!(matches!(result, Err(ModelError::InvalidId(_))));
}

#[tokio::test]
async fn paged_find_computes_metadata_and_shorthand_specs() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();
    kittens
        .insert_many(vec![
            Kitten::new("Ren", 9),
            Kitten::new("Stimpy", 7),
            Kitten::new("Sven", 8),
        ])
        .await
        .unwrap();

    let page = kittens
        .paged_find(doc! {}, "name lives", "name", 2, 1)
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].name, "Ren");
    assert_eq!(page.data[1].name, "Stimpy");

    assert_eq!(page.pages.current, 1);
    assert!(!page.pages.has_prev);
    assert!(page.pages.has_next);
    assert_eq!(page.pages.next, 2);
    assert_eq!(page.pages.total, 2);

    assert_eq!(page.items.begin, 1);
    assert_eq!(page.items.end, 2);
    assert_eq!(page.items.total, 3);

    let last = kittens
        .paged_find(doc! {}, "name lives", "name", 2, 2)
        .await
        .unwrap();

    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].name, "Sven");
    assert!(last.pages.has_prev);
    assert!(!last.pages.has_next);
    assert_eq!(last.items.begin, 3);
    assert_eq!(last.items.end, 3);
}

#[tokio::test]
async fn paged_find_with_no_matches_yields_empty_metadata() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let page = kittens
        .paged_find(doc! { "name": "Sven" }, "name lives", "name", 10, 1)
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.pages.total, 0);
    assert!(!page.pages.has_next);
    assert_eq!(page.items.begin, 0);
    assert_eq!(page.items.end, 0);
    assert_eq!(page.items.total, 0);
}

#[tokio::test]
async fn distinct_and_aggregate_return_raw_values() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();
    kittens
        .insert_many(vec![
            Kitten::new("Ren", 9),
            Kitten::new("Stimpy", 9),
            Kitten::new("Sven", 7),
        ])
        .await
        .unwrap();

    let lives = kittens.distinct("lives", doc! {}).await.unwrap();
    assert_eq!(lives, vec![Bson::Int32(9), Bson::Int32(7)]);

    let results = kittens
        .aggregate(vec![
            doc! { "$match": { "lives": 9 } },
            doc! { "$sort": { "name": -1 } },
        ])
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get_str("name").unwrap(), "Stimpy");
}

#[tokio::test]
async fn create_indexes_reports_index_names() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let names = kittens
        .create_indexes(vec![
            IndexSpec::ascending("name").with_unique(true),
            IndexSpec::new(doc! { "lives": -1 }),
        ])
        .await
        .unwrap();

    assert_eq!(names, vec!["name_1".to_string(), "lives_-1".to_string()]);
}

#[tokio::test]
async fn schema_validation_reports_field_errors_as_values() {
    let store = ModelStore::new(MemoryDriver::new());
    let kittens = store.collection::<Kitten>();

    let valid = kittens.validate(&doc! { "name": "Ren", "lives": 9 });
    assert!(valid.is_valid());

    let invalid = kittens.validate(&doc! { "name": "", "lives": "nine" });
    assert!(!invalid.is_valid());
    let fields: Vec<&str> = invalid.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "lives"]);
}

#[tokio::test]
async fn datetime_fields_roundtrip_through_bson() {
    let store = ModelStore::new(MemoryDriver::new());
    let adoptions = store.collection::<Adoption>();

    let adopted_at = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
    let adoption = adoptions
        .insert_one(Adoption {
            id: None,
            kitten: "Ren".to_string(),
            adopted_at: bson::DateTime::from_chrono(adopted_at),
        })
        .await
        .unwrap();

    let found = adoptions
        .find_by_id(&adoption.id.unwrap().to_hex())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.adopted_at.to_chrono(), adopted_at);
}

#[tokio::test]
async fn raw_collection_handles_untyped_documents() {
    let store = ModelStore::new(MemoryDriver::new());
    let raw = store.raw_collection("events");

    raw.insert_many(vec![doc! { "kind": "meow" }, doc! { "kind": "purr" }])
        .await
        .unwrap();

    let found = raw
        .find(doc! { "kind": "meow" }, FindOptions::new())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(store.list_collections().await.unwrap(), vec!["events".to_string()]);

    store.drop_collection("events").await.unwrap();
    assert!(store.list_collections().await.unwrap().is_empty());
}
