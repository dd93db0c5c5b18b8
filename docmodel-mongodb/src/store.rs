use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions as MongoFindOptions, IndexOptions, ReturnDocument},
};

use docmodel_core::{
    backend::{DriverBackend, DriverBackendBuilder},
    error::{ModelError, ModelResult},
    query::{FindOptions, IndexSpec, UpdateOptions},
    reply::{MutationReply, WriteReply},
};

/// MongoDB driver backend.
///
/// Holds one [`Client`] for the whole process; clients pool connections
/// internally, so this struct is cheap to share and the model layer never
/// reconnects on its own.
#[derive(Debug)]
pub struct MongoDriver {
    client: Client,
    database: String,
}

impl MongoDriver {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(uri: &str, database: &str) -> MongoDriverBuilder {
        MongoDriverBuilder::new(uri, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

fn backend_error(error: mongodb::error::Error) -> ModelError {
    ModelError::Backend(error.to_string())
}

fn return_document(options: &UpdateOptions) -> ReturnDocument {
    if options.return_updated {
        ReturnDocument::After
    } else {
        ReturnDocument::Before
    }
}

/// Ensures a document carries an `_id` before the write, so the echoed
/// reply carries identity without a read-back.
fn ensure_id(document: &mut Document) {
    if !document.contains_key("_id") {
        let mut with_id = doc! { "_id": ObjectId::new() };
        for (key, value) in document.iter() {
            with_id.insert(key.clone(), value.clone());
        }
        *document = with_id;
    }
}

#[async_trait]
impl DriverBackend for MongoDriver {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        let driver_options = MongoFindOptions::builder()
            .limit(options.limit)
            .skip(options.skip)
            .sort(options.sort)
            .projection(options.projection)
            .build();

        self.get_collection(collection)
            .find(filter)
            .with_options(driver_options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> ModelResult<Option<Document>> {
        let coll = self.get_collection(collection);
        let mut action = coll.find_one(filter);
        if let Some(projection) = projection {
            action = action.projection(projection);
        }

        action.await.map_err(backend_error)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply> {
        let value = self
            .get_collection(collection)
            .find_one_and_update(filter, update)
            .upsert(options.upsert)
            .return_document(return_document(&options))
            .await
            .map_err(backend_error)?;

        Ok(MutationReply { value })
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<MutationReply> {
        let value = self
            .get_collection(collection)
            .find_one_and_replace(filter, replacement)
            .upsert(options.upsert)
            .return_document(return_document(&options))
            .await
            .map_err(backend_error)?;

        Ok(MutationReply { value })
    }

    async fn find_one_and_delete(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelResult<MutationReply> {
        let value = self
            .get_collection(collection)
            .find_one_and_delete(filter)
            .await
            .map_err(backend_error)?;

        Ok(MutationReply { value })
    }

    async fn insert_one(&self, collection: &str, document: Document) -> ModelResult<WriteReply> {
        self.insert_many(collection, vec![document]).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> ModelResult<WriteReply> {
        let mut inserted = documents;
        for document in &mut inserted {
            ensure_id(document);
        }

        self.get_collection(collection)
            .insert_many(inserted.clone())
            .await
            .map_err(backend_error)?;

        log::debug!("inserted {} document(s) into {collection}", inserted.len());

        Ok(WriteReply { inserted })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        let result = self
            .get_collection(collection)
            .update_one(filter, update)
            .upsert(options.upsert)
            .await
            .map_err(backend_error)?;

        Ok(result.modified_count + u64::from(result.upserted_id.is_some()))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        let result = self
            .get_collection(collection)
            .update_many(filter, update)
            .upsert(options.upsert)
            .await
            .map_err(backend_error)?;

        Ok(result.modified_count + u64::from(result.upserted_id.is_some()))
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> ModelResult<u64> {
        let result = self
            .get_collection(collection)
            .replace_one(filter, replacement)
            .upsert(options.upsert)
            .await
            .map_err(backend_error)?;

        Ok(result.modified_count + u64::from(result.upserted_id.is_some()))
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        let result = self
            .get_collection(collection)
            .delete_one(filter)
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        let result = self
            .get_collection(collection)
            .delete_many(filter)
            .await
            .map_err(backend_error)?;

        Ok(result.deleted_count)
    }

    async fn count(&self, collection: &str, filter: Document) -> ModelResult<u64> {
        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelResult<Vec<Bson>> {
        self.get_collection(collection)
            .distinct(field, filter)
            .await
            .map_err(backend_error)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelResult<Vec<Document>> {
        self.get_collection(collection)
            .aggregate(pipeline)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: Vec<IndexSpec>,
    ) -> ModelResult<Vec<String>> {
        let models = indexes
            .into_iter()
            .map(|index| {
                IndexModel::builder()
                    .keys(index.keys.clone())
                    .options(
                        IndexOptions::builder()
                            .unique(index.unique)
                            .name(index.name.clone())
                            .build(),
                    )
                    .build()
            })
            .collect::<Vec<_>>();

        let result = self
            .get_collection(collection)
            .create_indexes(models)
            .await
            .map_err(backend_error)?;

        Ok(result.index_names)
    }

    async fn drop_collection(&self, name: &str) -> ModelResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)
    }

    async fn list_collections(&self) -> ModelResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error)
    }

    async fn shutdown(self) -> ModelResult<()> {
        self.client.shutdown().await;
        log::debug!("mongodb client shut down");

        Ok(())
    }
}

/// Builder for [`MongoDriver`] connections.
pub struct MongoDriverBuilder {
    uri: String,
    database: String,
}

impl MongoDriverBuilder {
    pub fn new(uri: &str, database: &str) -> Self {
        Self {
            uri: uri.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl DriverBackendBuilder for MongoDriverBuilder {
    type Backend = MongoDriver;

    async fn connect(self) -> ModelResult<Self::Backend> {
        let options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| ModelError::Initialization(e.to_string()))?;
        let client =
            Client::with_options(options).map_err(|e| ModelError::Initialization(e.to_string()))?;

        log::debug!("connected to database {}", self.database);

        Ok(MongoDriver::new(client, self.database))
    }
}
