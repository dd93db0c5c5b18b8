//! The model store: owns the driver connection and hands out collections.
//!
//! A [`ModelStore`] is the explicit connection/context object of the layer.
//! The owning application establishes it once (through a
//! [`DriverBackendBuilder`](crate::backend::DriverBackendBuilder)) and tears
//! it down once with [`shutdown`](ModelStore::shutdown); there is no
//! process-wide shared handle.
//!
//! # Example
//!
//! ```ignore
//! use docmodel::store::ModelStore;
//!
//! let store = ModelStore::new(backend);
//! let users = store.collection::<User>();
//! ```

use crate::{
    backend::DriverBackend,
    collection::{ModelCollection, RawCollection},
    document::Model,
    error::ModelResult,
};

/// A store bound to a specific driver backend.
#[derive(Debug)]
pub struct ModelStore<B: DriverBackend> {
    backend: B,
}

impl<B: DriverBackend> ModelStore<B> {
    /// Creates a store over an already-connected backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets the typed collection for a model type.
    ///
    /// The collection name comes from [`Model::collection_name`].
    pub fn collection<'a, M: Model>(&'a self) -> ModelCollection<'a, B, M> {
        ModelCollection::new(&self.backend)
    }

    /// Gets an untyped collection with the given name.
    pub fn raw_collection<'a>(&'a self, name: &str) -> RawCollection<'a, B> {
        RawCollection::new(name.to_string(), &self.backend)
    }

    /// Drops (deletes) a collection and all its documents.
    pub async fn drop_collection(&self, name: &str) -> ModelResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> ModelResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Disconnects, consuming the store.
    pub async fn shutdown(self) -> ModelResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}
