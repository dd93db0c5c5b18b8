//! Main docmodel crate providing a typed model layer over document databases.
//!
//! This crate is the primary entry point for users of the docmodel framework.
//! It re-exports the core types from the sub-crates and provides convenient
//! access to the available driver backends.
//!
//! # Features
//!
//! - **Typed models** - Define your data structures with Serde and get typed
//!   CRUD verbs per collection
//! - **Result normalization** - Every verb classifies the driver's raw reply
//!   and hands back model instances, never loose documents
//! - **Pagination** - `paged_find` runs count and fetch concurrently and
//!   computes full page/item metadata
//! - **Compact query shorthand** - `"name -secret"` projections and
//!   `"-created_at"` sorts alongside structured documents
//! - **Schema validation** - Declarative field rules checked on demand,
//!   reported as values rather than raised as errors
//!
//! # Quick Start
//!
//! ```ignore
//! use docmodel::{prelude::*, memory::MemoryDriver};
//! use bson::{doc, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//!
//! impl Model for User {
//!     fn id(&self) -> Option<&ObjectId> { self.id.as_ref() }
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ModelStore::new(MemoryDriver::new());
//!     let users = store.collection::<User>();
//!
//!     // Insert a user; the echoed instance carries its assigned identity.
//!     let alice = users.insert_one(User { id: None, name: "Alice".into() }).await?;
//!
//!     // Look it up again by the string form of its id.
//!     let found = users.find_by_id(&alice.id.unwrap().to_hex()).await?;
//!     println!("found: {found:?}");
//!
//!     // Page through the collection, two per page.
//!     let page = users.paged_find(doc! {}, "name", "name", 2, 1).await?;
//!     println!("{} of {} users", page.items.end, page.items.total);
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory driver for development and testing
//! - [`mongodb`] - Persistent MongoDB driver (requires the `mongodb` feature)

pub mod prelude;

pub use docmodel_core::{backend, collection, document, error, page, query, reply, schema, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory driver backend implementations.
pub mod memory {
    pub use docmodel_memory::{MemoryDriver, MemoryDriverBuilder};
}

/// MongoDB driver backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docmodel_mongodb::{MongoDriver, MongoDriverBuilder};
}
