//! A typed model layer placed in front of a document-database driver.
//!
//! This crate is the core of the docmodel project and provides:
//!
//! - **Model traits** ([`document`]) - Core traits for binding typed models to collections
//! - **Driver abstraction** ([`backend`]) - The narrow client interface a driver must implement
//! - **Result normalization** ([`reply`]) - Classification of raw driver replies into typed results
//! - **Query adapters** ([`query`]) - Projection/sort adapters and operation option structs
//! - **Pagination** ([`page`]) - Paged results with computed page/item metadata
//! - **Schema validation** ([`schema`]) - Declarative field rules with structured error values
//! - **Collections interface** ([`collection`]) - Per-model CRUD verbs
//! - **Store** ([`store`]) - Owns the driver connection and hands out collections
//! - **Error handling** ([`error`]) - Error types and result alias
//!
//! # Example
//!
//! ```ignore
//! use docmodel::{Model, ModelStore};
//! use bson::oid::ObjectId;
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
//!     fn id(&self) -> Option<&ObjectId> {
//!         self.id.as_ref()
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "users"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod reply;
pub mod schema;
pub mod store;
