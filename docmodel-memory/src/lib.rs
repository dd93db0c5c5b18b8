//! In-memory driver backend for docmodel.
//!
//! This crate provides a [`MemoryDriver`] implementation of the
//! `DriverBackend` trait backed by hashmaps behind async read-write locks.
//! It evaluates filters, updates, projections, and a small set of
//! aggregation stages in Mongo query syntax, making it the natural harness
//! for tests and local development.

#[allow(unused_extern_crates)]
extern crate self as docmodel_memory;

pub mod evaluator;
pub mod store;

pub use store::{MemoryDriver, MemoryDriverBuilder};
