//! Convenient re-exports of commonly used types from docmodel.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmodel::prelude::*;
//! ```

pub use docmodel_core::{
    backend::{DriverBackend, DriverBackendBuilder},
    collection::{ModelCollection, RawCollection},
    document::{Model, ModelExt, parse_object_id},
    error::{ModelError, ModelResult},
    page::{ItemInfo, PageInfo, PagedResult},
    query::{FindOptions, IndexSpec, Projection, SortSpec, UpdateOptions},
    reply::{MutationReply, Outcome, RawReply, WriteReply, normalize},
    schema::{FieldError, FieldRule, FieldType, Schema, Validation},
    store::ModelStore,
};
