//! In-memory driver backend.
//!
//! Stores each collection as an insertion-ordered vector of BSON documents
//! behind an async read-write lock. Every document is guaranteed an `_id`
//! at insert time, so the echoed write replies always carry identity.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use mea::rwlock::RwLock;

use docmodel_core::{
    backend::{DriverBackend, DriverBackendBuilder},
    error::{ModelError, ModelResult},
    query::{FindOptions, IndexSpec, UpdateOptions},
    reply::{MutationReply, WriteReply},
};

use crate::evaluator::{apply_update, matches_filter, project_document, sort_documents};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory driver backend.
///
/// Cloneable; clones share the same underlying data. Queries scan every
/// document in a collection, which is fine for tests and small datasets but
/// not for production-sized collections.
///
/// # Example
///
/// ```ignore
/// use docmodel_memory::MemoryDriver;
/// use docmodel::store::ModelStore;
///
/// let store = ModelStore::new(MemoryDriver::new());
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryDriver {
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryDriver {
    /// Creates a new empty in-memory driver.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    async fn matching_documents(
        &self,
        collection: &str,
        filter: &Document,
    ) -> ModelResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = Vec::new();
        for document in documents {
            if matches_filter(document, filter)? {
                matched.push(document.clone());
            }
        }

        Ok(matched)
    }
}

/// Ensures a document carries an `_id`, assigning a fresh ObjectId if absent.
fn ensure_id(document: &mut Document) {
    if !document.contains_key("_id") {
        let mut with_id = doc! { "_id": ObjectId::new() };
        for (key, value) in document.iter() {
            with_id.insert(key.clone(), value.clone());
        }
        *document = with_id;
    }
}

/// Builds the base document an upsert inserts when nothing matched: the
/// filter's plain-equality fields, with the update applied on top.
fn upsert_document(filter: &Document, update: &Document) -> ModelResult<Document> {
    let mut base = Document::new();
    for (key, value) in filter {
        if key.starts_with('$') {
            continue;
        }
        let is_operator = value
            .as_document()
            .and_then(|doc| doc.keys().next())
            .is_some_and(|op| op.starts_with('$'));
        if !is_operator {
            base.insert(key.clone(), value.clone());
        }
    }

    apply_update(&mut base, update)?;
    ensure_id(&mut base);

    Ok(base)
}

#[async_trait]
impl DriverBackend for MemoryDriver {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        let mut matched = self.matching_documents(collection, &filter).await?;

        if let Some(sort) = &options.sort {
            sort_documents(&mut matched, sort);
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options
            .limit
            .map(|limit| limit.max(0) as usize)
            .unwrap_or(usize::MAX);

        let mut page: Vec<Document> = matched.into_iter().skip(skip).take(limit).collect();

        if let Some(projection) = &options.projection {
            page = page
                .iter()
                .map(|document| project_document(document, projection))
                .collect();
        }

        Ok(page)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> ModelResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(None);
        };

        for document in documents {
            if matches_filter(document, &filter)? {
                let found = match &projection {
                    Some(projection) => project_document(document, projection),
                    None => document.clone(),
                };
                return Ok(Some(found));
            }
        }

        Ok(None)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        for document in documents.iter_mut() {
            if matches_filter(document, &filter)? {
                let before = document.clone();
                apply_update(document, &update)?;

                let value = if options.return_updated {
                    document.clone()
                } else {
                    before
                };
                return Ok(MutationReply::applied(value));
            }
        }

        if options.upsert {
            let inserted = upsert_document(&filter, &update)?;
            documents.push(inserted.clone());

            let value = if options.return_updated {
                Some(inserted)
            } else {
                None
            };
            return Ok(MutationReply { value });
        }

        Ok(MutationReply::no_match())
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        for document in documents.iter_mut() {
            if matches_filter(document, &filter)? {
                let before = document.clone();

                let mut replacement = replacement;
                if let Some(id) = before.get("_id") {
                    let mut keyed = doc! { "_id": id.clone() };
                    for (key, value) in replacement.iter().filter(|(key, _)| *key != "_id") {
                        keyed.insert(key.clone(), value.clone());
                    }
                    replacement = keyed;
                }
                *document = replacement;

                let value = if options.return_updated {
                    document.clone()
                } else {
                    before
                };
                return Ok(MutationReply::applied(value));
            }
        }

        if options.upsert {
            let mut inserted = replacement;
            ensure_id(&mut inserted);
            documents.push(inserted.clone());

            let value = if options.return_updated {
                Some(inserted)
            } else {
                None
            };
            return Ok(MutationReply { value });
        }

        Ok(MutationReply::no_match())
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelResult<MutationReply> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(MutationReply::no_match());
        };

        for (index, document) in documents.iter().enumerate() {
            if matches_filter(document, &filter)? {
                let removed = documents.remove(index);
                return Ok(MutationReply::applied(removed));
            }
        }

        Ok(MutationReply::no_match())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> ModelResult<WriteReply> {
        self.insert_many(collection, vec![document]).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> ModelResult<WriteReply> {
        let mut store = self.store.write().await;
        let existing = store.entry(collection.to_string()).or_default();

        let mut inserted = Vec::with_capacity(documents.len());
        for mut document in documents {
            ensure_id(&mut document);

            let id = document.get("_id").cloned().unwrap_or(Bson::Null);
            let duplicate = existing
                .iter()
                .chain(inserted.iter())
                .any(|doc: &Document| doc.get("_id") == Some(&id));
            if duplicate {
                return Err(ModelError::Backend(format!(
                    "duplicate _id {id} in collection {collection}"
                )));
            }

            inserted.push(document);
        }

        existing.extend(inserted.iter().cloned());
        log::debug!(
            "inserted {} document(s) into {collection}",
            inserted.len()
        );

        Ok(WriteReply { inserted })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        for document in documents.iter_mut() {
            if matches_filter(document, &filter)? {
                apply_update(document, &update)?;
                return Ok(1);
            }
        }

        if options.upsert {
            documents.push(upsert_document(&filter, &update)?);
            return Ok(1);
        }

        Ok(0)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        let mut modified = 0;
        for document in documents.iter_mut() {
            if matches_filter(document, &filter)? {
                apply_update(document, &update)?;
                modified += 1;
            }
        }

        if modified == 0 && options.upsert {
            documents.push(upsert_document(&filter, &update)?);
            modified = 1;
        }

        Ok(modified)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        // The post-image is requested so a match or upsert always carries a
        // value; the caller only sees the count.
        let options = UpdateOptions { return_updated: true, ..options };
        let reply = self
            .find_one_and_replace(collection, filter, replacement, options)
            .await?;

        Ok(reply.value.map(|_| 1).unwrap_or(0))
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        let reply = self.find_one_and_delete(collection, filter).await?;

        Ok(reply.value.map(|_| 1).unwrap_or(0))
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        let mut kept = Vec::with_capacity(documents.len());
        let mut deleted = 0;
        for document in documents.drain(..) {
            if matches_filter(&document, &filter)? {
                deleted += 1;
            } else {
                kept.push(document);
            }
        }
        *documents = kept;

        Ok(deleted)
    }

    async fn count(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        let matched = self.matching_documents(collection, &filter).await?;

        Ok(matched.len() as u64)
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelResult<Vec<Bson>> {
        let matched = self.matching_documents(collection, &filter).await?;

        // First-seen order; array fields contribute their elements.
        let mut values: Vec<Bson> = Vec::new();
        for document in &matched {
            let Some(value) = document.get(field) else {
                continue;
            };

            let candidates: Vec<&Bson> = match value {
                Bson::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for candidate in candidates {
                if !values.contains(candidate) {
                    values.push(candidate.clone());
                }
            }
        }

        Ok(values)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelResult<Vec<Document>> {
        let mut documents = self
            .matching_documents(collection, &Document::new())
            .await?;

        for stage in &pipeline {
            let mut entries = stage.iter();
            let (name, spec) = entries.next().ok_or_else(|| {
                ModelError::Unsupported("empty aggregation stage".to_string())
            })?;

            match name.as_str() {
                "$match" => {
                    let filter = spec.as_document().ok_or_else(|| {
                        ModelError::Unsupported("$match expects a filter document".to_string())
                    })?;
                    let mut matched = Vec::new();
                    for document in documents {
                        if matches_filter(&document, filter)? {
                            matched.push(document);
                        }
                    }
                    documents = matched;
                }
                "$sort" => {
                    let sort = spec.as_document().ok_or_else(|| {
                        ModelError::Unsupported("$sort expects a sort document".to_string())
                    })?;
                    sort_documents(&mut documents, sort);
                }
                "$skip" => {
                    let skip = spec.as_i64().or(spec.as_i32().map(i64::from)).ok_or_else(
                        || ModelError::Unsupported("$skip expects an integer".to_string()),
                    )?;
                    documents = documents.into_iter().skip(skip.max(0) as usize).collect();
                }
                "$limit" => {
                    let limit = spec.as_i64().or(spec.as_i32().map(i64::from)).ok_or_else(
                        || ModelError::Unsupported("$limit expects an integer".to_string()),
                    )?;
                    documents = documents.into_iter().take(limit.max(0) as usize).collect();
                }
                other => {
                    log::warn!("aggregation stage {other} is not supported by the memory driver");
                    return Err(ModelError::Unsupported(format!(
                        "aggregation stage {other} is not supported by the memory driver"
                    )));
                }
            }
        }

        Ok(documents)
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: Vec<IndexSpec>,
    ) -> ModelResult<Vec<String>> {
        // No indexing in memory; still materialize the collection and report
        // the names that would have been created.
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default();

        Ok(indexes.into_iter().map(|index| index.index_name()).collect())
    }

    async fn drop_collection(&self, name: &str) -> ModelResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(ModelError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }

    async fn list_collections(&self) -> ModelResult<Vec<String>> {
        Ok(self.store.read().await.keys().cloned().collect())
    }

    async fn shutdown(self) -> ModelResult<()> {
        log::debug!("memory driver shut down");

        Ok(())
    }
}

/// Builder for [`MemoryDriver`] connections.
///
/// Connecting always succeeds and returns a fresh, empty driver.
#[derive(Default)]
pub struct MemoryDriverBuilder;

#[async_trait]
impl DriverBackendBuilder for MemoryDriverBuilder {
    type Backend = MemoryDriver;

    async fn connect(self) -> ModelResult<Self::Backend> {
        Ok(MemoryDriver::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_ids_and_echoes_in_order() {
        let driver = MemoryDriver::new();

        let reply = driver
            .insert_many(
                "kittens",
                vec![doc! { "name": "Ren" }, doc! { "name": "Stimpy" }],
            )
            .await
            .unwrap();

        assert_eq!(reply.inserted.len(), 2);
        assert_eq!(reply.inserted[0].get_str("name").unwrap(), "Ren");
        assert_eq!(reply.inserted[1].get_str("name").unwrap(), "Stimpy");
        for document in &reply.inserted {
            assert!(document.get_object_id("_id").is_ok());
        }
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let driver = MemoryDriver::new();
        let id = ObjectId::new();

        driver
            .insert_one("kittens", doc! { "_id": id, "name": "Ren" })
            .await
            .unwrap();
        let result = driver
            .insert_one("kittens", doc! { "_id": id, "name": "Stimpy" })
            .await;

        assert!(matches!(result, Err(ModelError::Backend(_))));
    }

    #[tokio::test]
    async fn find_applies_sort_skip_limit_and_projection() {
        let driver = MemoryDriver::new();
        driver
            .insert_many(
                "kittens",
                vec![
                    doc! { "name": "c", "lives": 7 },
                    doc! { "name": "a", "lives": 9 },
                    doc! { "name": "b", "lives": 8 },
                ],
            )
            .await
            .unwrap();

        let options = FindOptions::new()
            .with_sort(doc! { "name": 1 })
            .with_skip(1)
            .with_limit(1)
            .with_projection(doc! { "name": true, "_id": false });
        let found = driver
            .find("kittens", Document::new(), options)
            .await
            .unwrap();

        assert_eq!(found, vec![doc! { "name": "b" }]);
    }

    #[tokio::test]
    async fn find_one_and_update_returns_updated_by_default() {
        let driver = MemoryDriver::new();
        driver
            .insert_one("kittens", doc! { "name": "Ren", "lives": 9 })
            .await
            .unwrap();

        let reply = driver
            .find_one_and_update(
                "kittens",
                doc! { "name": "Ren" },
                doc! { "$inc": { "lives": -1 } },
                UpdateOptions::default(),
            )
            .await
            .unwrap();

        let value = reply.value.unwrap();
        assert_eq!(value.get_i32("lives").unwrap(), 8);
    }

    #[tokio::test]
    async fn find_one_and_update_misses_cleanly() {
        let driver = MemoryDriver::new();

        let reply = driver
            .find_one_and_update(
                "kittens",
                doc! { "name": "Sven" },
                doc! { "$set": { "lives": 1 } },
                UpdateOptions::default(),
            )
            .await
            .unwrap();

        assert!(reply.value.is_none());
    }

    #[tokio::test]
    async fn upsert_inserts_from_filter_equality_fields() {
        let driver = MemoryDriver::new();

        let reply = driver
            .find_one_and_update(
                "kittens",
                doc! { "name": "Sven" },
                doc! { "$set": { "lives": 9 } },
                UpdateOptions::default().with_upsert(true),
            )
            .await
            .unwrap();

        let value = reply.value.unwrap();
        assert_eq!(value.get_str("name").unwrap(), "Sven");
        assert_eq!(value.get_i32("lives").unwrap(), 9);
        assert!(value.get_object_id("_id").is_ok());
        assert_eq!(driver.count("kittens", Document::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_one_counts_an_upsert_even_when_returning_the_original() {
        let driver = MemoryDriver::new();

        let modified = driver
            .update_one(
                "kittens",
                doc! { "name": "Sven" },
                doc! { "$set": { "lives": 9 } },
                UpdateOptions::default().with_upsert(true).return_original(),
            )
            .await
            .unwrap();

        assert_eq!(modified, 1);
        assert_eq!(driver.count("kittens", Document::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_one_counts_an_upsert_even_when_returning_the_original() {
        let driver = MemoryDriver::new();

        let modified = driver
            .replace_one(
                "kittens",
                doc! { "name": "Sven" },
                doc! { "name": "Sven", "lives": 9 },
                UpdateOptions::default().with_upsert(true).return_original(),
            )
            .await
            .unwrap();

        assert_eq!(modified, 1);
        assert_eq!(driver.count("kittens", Document::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_preserves_identity() {
        let driver = MemoryDriver::new();
        let reply = driver
            .insert_one("kittens", doc! { "name": "Ren" })
            .await
            .unwrap();
        let id = reply.inserted[0].get_object_id("_id").unwrap();

        let reply = driver
            .find_one_and_replace(
                "kittens",
                doc! { "name": "Ren" },
                doc! { "name": "Stimpy" },
                UpdateOptions::default(),
            )
            .await
            .unwrap();

        let value = reply.value.unwrap();
        assert_eq!(value.get_object_id("_id").unwrap(), id);
        assert_eq!(value.get_str("name").unwrap(), "Stimpy");
    }

    #[tokio::test]
    async fn delete_many_reports_the_count() {
        let driver = MemoryDriver::new();
        driver
            .insert_many(
                "kittens",
                vec![
                    doc! { "name": "a", "adopted": true },
                    doc! { "name": "b", "adopted": true },
                    doc! { "name": "c", "adopted": false },
                ],
            )
            .await
            .unwrap();

        let deleted = driver
            .delete_many("kittens", doc! { "adopted": true })
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(driver.count("kittens", Document::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn distinct_flattens_arrays_and_dedupes() {
        let driver = MemoryDriver::new();
        driver
            .insert_many(
                "kittens",
                vec![
                    doc! { "tags": ["soft", "loud"] },
                    doc! { "tags": ["loud"] },
                    doc! { "tags": "calm" },
                ],
            )
            .await
            .unwrap();

        let values = driver
            .distinct("kittens", "tags", Document::new())
            .await
            .unwrap();

        assert_eq!(
            values,
            vec![
                Bson::String("soft".to_string()),
                Bson::String("loud".to_string()),
                Bson::String("calm".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn aggregate_supports_match_sort_skip_limit() {
        let driver = MemoryDriver::new();
        driver
            .insert_many(
                "kittens",
                vec![
                    doc! { "name": "a", "lives": 9 },
                    doc! { "name": "b", "lives": 7 },
                    doc! { "name": "c", "lives": 8 },
                    doc! { "name": "d", "lives": 3 },
                ],
            )
            .await
            .unwrap();

        let results = driver
            .aggregate(
                "kittens",
                vec![
                    doc! { "$match": { "lives": { "$gte": 7 } } },
                    doc! { "$sort": { "lives": -1 } },
                    doc! { "$skip": 1 },
                    doc! { "$limit": 1 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get_str("name").unwrap(), "c");
    }

    #[tokio::test]
    async fn unsupported_aggregation_stage_errors() {
        let driver = MemoryDriver::new();
        let result = driver
            .aggregate("kittens", vec![doc! { "$group": { "_id": "$name" } }])
            .await;

        assert!(matches!(result, Err(ModelError::Unsupported(_))));
    }

    #[tokio::test]
    async fn drop_collection_requires_existence() {
        let driver = MemoryDriver::new();
        driver
            .insert_one("kittens", doc! { "name": "Ren" })
            .await
            .unwrap();

        driver.drop_collection("kittens").await.unwrap();
        let result = driver.drop_collection("kittens").await;

        assert!(matches!(result, Err(ModelError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn create_indexes_reports_names() {
        let driver = MemoryDriver::new();

        let names = driver
            .create_indexes(
                "kittens",
                vec![
                    IndexSpec::ascending("name"),
                    IndexSpec::new(doc! { "name": 1, "lives": 1 }).with_name("by_name_lives"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(names, vec!["name_1".to_string(), "by_name_lives".to_string()]);
        assert_eq!(
            driver.list_collections().await.unwrap(),
            vec!["kittens".to_string()]
        );
    }
}
