//! Error types and result types for model operations.
//!
//! This module provides error handling for all model-layer operations.
//! Use [`ModelResult<T>`] as the return type for fallible operations.
//!
//! Schema validation failures are deliberately not represented here: they are
//! reported as a structured [`Validation`](crate::schema::Validation) value,
//! not as an error used for control flow.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur in the model layer.
///
/// Driver-level failures are carried through unchanged in content; the core
/// never catches and suppresses them.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Serialization/deserialization error when converting between model and document formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during connection setup or driver initialization.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A caller-supplied identifier could not be parsed into an ObjectId.
    /// The operation carrying it is rejected, never silently matched against nothing.
    #[error("Invalid object id: {0}")]
    InvalidId(String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// An error surfaced by the underlying database driver.
    #[error("Driver error: {0}")]
    Backend(String),
    /// The operation is not supported by the active driver.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    /// An unknown error occurred.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// A specialized `Result` type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

impl From<BsonError> for ModelError {
    fn from(err: BsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ModelError {
    fn from(err: SerdeJsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
