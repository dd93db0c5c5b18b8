//! MongoDB driver backend for docmodel.
//!
//! This crate provides a [`MongoDriver`] implementation of the
//! `DriverBackend` trait on top of the official async MongoDB driver,
//! giving the model layer persistent storage with the full server-side
//! query engine behind it.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docmodel = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The backend holds the process's single client handle. Connect once
//! through the builder, and shut down once through the store:
//!
//! ```ignore
//! use docmodel::{backend::DriverBackendBuilder, mongodb::MongoDriver, store::ModelStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDriver::builder("mongodb://localhost:27017", "my_database")
//!         .connect()
//!         .await?;
//!     let store = ModelStore::new(backend);
//!
//!     // ... use the store ...
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmodel_mongodb;

pub mod store;

pub use store::{MongoDriver, MongoDriverBuilder};
