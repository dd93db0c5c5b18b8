//! Per-collection interfaces: typed model verbs and raw document access.
//!
//! [`ModelCollection`] binds a [`Model`] type to its collection and exposes
//! the CRUD verb surface; find-and-mutate and insert verbs route the driver's
//! tagged replies through the result normalizer. [`RawCollection`] offers the
//! same plumbing for explicit BSON documents without a model type.

use bson::{Bson, Document, doc};
use futures::try_join;
use std::marker::PhantomData;

use crate::{
    backend::DriverBackend,
    document::{Model, ModelExt, parse_object_id},
    error::{ModelError, ModelResult},
    page::{PagedResult, compute_metadata},
    query::{FindOptions, IndexSpec, Projection, SortSpec, UpdateOptions},
    reply::{RawReply, normalize},
    schema::Validation,
};

/// A typed collection bound to one model type.
///
/// # Example
///
/// ```ignore
/// # async fn example(store: &docmodel::store::ModelStore<impl docmodel::backend::DriverBackend>) -> docmodel::error::ModelResult<()> {
/// let users = store.collection::<User>();
/// let alice = users.insert_one(User { id: None, name: "Alice".into() }).await?;
/// assert!(alice.id.is_some());
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct ModelCollection<'a, B: DriverBackend, M: Model> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<M>,
}

impl<'a, B: DriverBackend, M: Model> ModelCollection<'a, B, M> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self {
            name: M::collection_name().to_string(),
            backend,
            _marker: PhantomData,
        }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates a raw document against the model's schema.
    ///
    /// Advisory only; writes never validate implicitly.
    pub fn validate(&self, document: &Document) -> Validation {
        M::schema().validate(document)
    }

    /// Inserts one model, returning it as written (identity assigned).
    pub async fn insert_one(&self, model: M) -> ModelResult<M> {
        let reply = self
            .backend
            .insert_one(&self.name, model.to_document()?)
            .await?;

        normalize::<M>(reply.into())?
            .into_one()
            .ok_or_else(|| ModelError::Unknown("insert echoed no document".to_string()))
    }

    /// Inserts many models, returning them as written, order preserved.
    pub async fn insert_many(&self, models: Vec<M>) -> ModelResult<Vec<M>> {
        let documents = models
            .into_iter()
            .map(|m| m.to_document())
            .collect::<ModelResult<Vec<Document>>>()?;

        let reply = self
            .backend
            .insert_many(&self.name, documents)
            .await?;

        Ok(normalize::<M>(reply.into())?.into_many())
    }

    /// Returns the models matching `filter`.
    pub async fn find(&self, filter: Document, options: FindOptions) -> ModelResult<Vec<M>> {
        let documents = self
            .backend
            .find(&self.name, filter, options)
            .await?;

        Ok(normalize::<M>(RawReply::Documents(documents))?.into_many())
    }

    /// Returns the first model matching `filter`, or `None`.
    pub async fn find_one(
        &self,
        filter: Document,
        projection: Option<Projection>,
    ) -> ModelResult<Option<M>> {
        let document = self
            .backend
            .find_one(&self.name, filter, projection.map(|p| p.to_document()))
            .await?;

        match document {
            Some(doc) => Ok(normalize::<M>(RawReply::Document(doc))?.into_one()),
            None => Ok(None),
        }
    }

    /// Looks up a model by its string identifier.
    ///
    /// A malformed id rejects the operation with
    /// [`ModelError::InvalidId`] before the driver is consulted.
    pub async fn find_by_id(&self, id: &str) -> ModelResult<Option<M>> {
        let id = parse_object_id(id)?;
        self.find_one(doc! { "_id": id }, None).await
    }

    /// Applies an update to the model with the given id.
    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<Option<M>> {
        let id = parse_object_id(id)?;
        self.find_one_and_update(doc! { "_id": id }, update, options)
            .await
    }

    /// Deletes the model with the given id, returning it.
    pub async fn find_by_id_and_delete(&self, id: &str) -> ModelResult<Option<M>> {
        let id = parse_object_id(id)?;
        self.find_one_and_delete(doc! { "_id": id }).await
    }

    /// Applies an update to the first matching model and returns the pre- or
    /// post-mutation instance per `options`; `None` when nothing matched.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<Option<M>> {
        let reply = self
            .backend
            .find_one_and_update(&self.name, filter, update, options)
            .await?;

        Ok(normalize::<M>(reply.into())?.into_one())
    }

    /// Replaces the first matching model wholesale.
    pub async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: M,
        options: UpdateOptions,
    ) -> ModelResult<Option<M>> {
        let reply = self
            .backend
            .find_one_and_replace(&self.name, filter, replacement.to_document()?, options)
            .await?;

        Ok(normalize::<M>(reply.into())?.into_one())
    }

    /// Deletes the first matching model, returning it.
    pub async fn find_one_and_delete(&self, filter: Document) -> ModelResult<Option<M>> {
        let reply = self
            .backend
            .find_one_and_delete(&self.name, filter)
            .await?;

        Ok(normalize::<M>(reply.into())?.into_one())
    }

    /// Applies an update to the first matching document; returns the
    /// modified count.
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        self.backend
            .update_one(&self.name, filter, update, options)
            .await
    }

    /// Applies an update to every matching document.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        self.backend
            .update_many(&self.name, filter, update, options)
            .await
    }

    /// Replaces the first matching document; returns the modified count.
    pub async fn replace_one(
        &self,
        filter: Document,
        replacement: M,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        self.backend
            .replace_one(&self.name, filter, replacement.to_document()?, options)
            .await
    }

    /// Deletes the first matching document; returns the deleted count.
    pub async fn delete_one(&self, filter: Document) -> ModelResult<u64> {
        self.backend.delete_one(&self.name, filter).await
    }

    /// Deletes every matching document; returns the deleted count.
    pub async fn delete_many(&self, filter: Document) -> ModelResult<u64> {
        self.backend.delete_many(&self.name, filter).await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: Document) -> ModelResult<u64> {
        self.backend.count(&self.name, filter).await
    }

    /// Returns the distinct values of `field` among matching documents.
    pub async fn distinct(&self, field: &str, filter: Document) -> ModelResult<Vec<Bson>> {
        self.backend
            .distinct(&self.name, field, filter)
            .await
    }

    /// Runs an aggregation pipeline, returning the raw result documents.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> ModelResult<Vec<Document>> {
        self.backend
            .aggregate(&self.name, pipeline)
            .await
    }

    /// Creates the given indexes on this collection; returns their names.
    pub async fn create_indexes(&self, indexes: Vec<IndexSpec>) -> ModelResult<Vec<String>> {
        self.backend
            .create_indexes(&self.name, indexes)
            .await
    }

    /// Fetches one page of matching models plus computed paging metadata.
    ///
    /// `fields` and `sort` accept either structured mappings or the compact
    /// string shorthand. The total count and the bounded fetch run
    /// concurrently; if either fails the whole call fails, with no partial
    /// result.
    pub async fn paged_find(
        &self,
        filter: Document,
        fields: impl Into<Projection> + Send,
        sort: impl Into<SortSpec> + Send,
        limit: i64,
        page: i64,
    ) -> ModelResult<PagedResult<M>> {
        let options = FindOptions::new()
            .with_projection(fields.into())
            .with_sort(sort.into())
            .with_limit(limit)
            .with_skip(((page - 1) * limit).max(0) as u64);

        let (total, documents) = try_join!(
            self.backend.count(&self.name, filter.clone()),
            self.backend.find(&self.name, filter, options),
        )?;

        let data = normalize::<M>(RawReply::Documents(documents))?.into_many();
        let (pages, items) = compute_metadata(limit, page, total as i64);

        Ok(PagedResult { data, pages, items })
    }
}

/// An untyped collection handling explicit BSON documents.
#[derive(Debug)]
pub struct RawCollection<'a, B: DriverBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: DriverBackend> RawCollection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the documents matching `filter`.
    pub async fn find(&self, filter: Document, options: FindOptions) -> ModelResult<Vec<Document>> {
        self.backend
            .find(&self.name, filter, options)
            .await
    }

    /// Returns the first document matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Document) -> ModelResult<Option<Document>> {
        self.backend
            .find_one(&self.name, filter, None)
            .await
    }

    /// Inserts raw documents, returning them as written.
    pub async fn insert_many(&self, documents: Vec<Document>) -> ModelResult<Vec<Document>> {
        Ok(self
            .backend
            .insert_many(&self.name, documents)
            .await?
            .inserted)
    }

    /// Applies an update to every matching document.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        self.backend
            .update_many(&self.name, filter, update, options)
            .await
    }

    /// Deletes every matching document.
    pub async fn delete_many(&self, filter: Document) -> ModelResult<u64> {
        self.backend.delete_many(&self.name, filter).await
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, filter: Document) -> ModelResult<u64> {
        self.backend.count(&self.name, filter).await
    }

    /// Runs an aggregation pipeline.
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> ModelResult<Vec<Document>> {
        self.backend
            .aggregate(&self.name, pipeline)
            .await
    }
}
