//! Driver abstraction for the model layer.
//!
//! This module defines the narrow client interface a document-database driver
//! must implement. The model layer contributes no query planning or retry
//! logic of its own; every method is argument forwarding into the driver, and
//! every driver failure is surfaced to the caller unmodified.
//!
//! # Traits
//!
//! - [`DriverBackend`]: one typed method per driver operation
//! - [`DriverBackendBuilder`]: the connect half of the connection lifecycle
//!
//! # Examples
//!
//! ```ignore
//! use docmodel::backend::DriverBackend;
//! use bson::doc;
//!
//! let backend = MyDriverImpl::new();
//! let written = backend.insert_one("users", doc! { "name": "Alice" }).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{
    error::ModelResult,
    query::{FindOptions, IndexSpec, UpdateOptions},
    reply::{MutationReply, WriteReply},
};

/// Abstract interface over a document-database driver.
///
/// Implementations hold the process's single connection handle; the model
/// layer establishes it once through a [`DriverBackendBuilder`] and tears it
/// down once through [`shutdown`](DriverBackend::shutdown). Pooling, retries,
/// and reconnection are the driver's responsibility, not this trait's.
///
/// # Thread Safety
///
/// All implementations must be thread-safe (`Send + Sync`) and support
/// concurrent access from multiple async tasks: the pager issues its count
/// and fetch concurrently against the same backend.
///
/// # Error Handling
///
/// Operations return [`ModelResult<T>`](crate::error::ModelResult). Failures
/// from the underlying database must be carried through unchanged in content;
/// implementations map them to [`ModelError::Backend`](crate::error::ModelError)
/// without filtering or retrying.
#[async_trait]
pub trait DriverBackend: Send + Sync + Debug {
    /// Returns the documents matching `filter`, honoring projection, sort,
    /// skip, and limit from `options`.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> ModelResult<Option<Document>>;

    /// Applies an update to the first matching document and returns the
    /// mutation wrapper carrying the pre- or post-mutation document.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply>;

    /// Replaces the first matching document wholesale.
    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply>;

    /// Deletes the first matching document, returning it in the wrapper.
    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelResult<MutationReply>;

    /// Inserts one document. A missing `_id` is assigned before the write so
    /// the echoed document carries its identity.
    async fn insert_one(&self, collection: &str, document: Document) -> ModelResult<WriteReply>;

    /// Inserts many documents, preserving order in the echoed reply.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> ModelResult<WriteReply>;

    /// Applies an update to the first matching document; returns the number
    /// of documents modified (or upserted).
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64>;

    /// Applies an update to every matching document.
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64>;

    /// Replaces the first matching document; returns the modified count.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64>;

    /// Deletes the first matching document; returns the deleted count.
    async fn delete_one(&self, collection: &str, filter: Document) -> ModelResult<u64>;

    /// Deletes every matching document; returns the deleted count.
    async fn delete_many(&self, collection: &str, filter: Document) -> ModelResult<u64>;

    /// Counts the documents matching `filter`.
    async fn count(&self, collection: &str, filter: Document) -> ModelResult<u64>;

    /// Returns the distinct values of `field` among documents matching `filter`.
    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelResult<Vec<Bson>>;

    /// Runs an aggregation pipeline and returns the raw result documents.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelResult<Vec<Document>>;

    /// Creates the given indexes; returns their names.
    async fn create_indexes(
        &self,
        collection: &str,
        indexes: Vec<IndexSpec>,
    ) -> ModelResult<Vec<String>>;

    /// Drops (deletes) a collection and all its documents.
    async fn drop_collection(&self, name: &str) -> ModelResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> ModelResult<Vec<String>>;

    /// Cleanly disconnects, releasing the connection handle.
    ///
    /// The default implementation is a no-op; drivers holding a live
    /// connection should override it.
    async fn shutdown(self) -> ModelResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for establishing a driver connection.
#[async_trait]
pub trait DriverBackendBuilder {
    type Backend: DriverBackend;

    /// Connects and returns the live backend, or an
    /// [`Initialization`](crate::error::ModelError::Initialization) error.
    async fn connect(self) -> ModelResult<Self::Backend>;
}
