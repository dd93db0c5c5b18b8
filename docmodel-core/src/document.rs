//! Core traits for binding typed models to collections.
//!
//! This module provides the fundamental trait that all stored models must implement,
//! as well as utilities for converting models between document and JSON formats and
//! for parsing caller-supplied identifiers.

use bson::{Bson, Document, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::{
    error::{ModelError, ModelResult},
    schema::{Schema, Validation},
};

/// Core trait that binds a schema-bearing type to one collection.
///
/// Every model is associated 1:1 with a collection name and a validation
/// schema. Identity is the `_id` field, a 12-byte time-ordered [`ObjectId`]
/// assigned either by the caller or generated by the driver on insert; the
/// field is therefore optional on the model until a write assigns it.
///
/// # Example
///
/// ```ignore
/// use docmodel::document::Model;
/// use bson::oid::ObjectId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub name: String,
///     pub email: String,
/// }
///
/// impl Model for User {
///     fn id(&self) -> Option<&ObjectId> {
///         self.id.as_ref()
///     }
///
///     fn collection_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Model: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns this model's identifier, if one has been assigned.
    fn id(&self) -> Option<&ObjectId>;

    /// Returns the name of the collection this model is bound to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users", "products").
    fn collection_name() -> &'static str;

    /// Returns the validation schema for this model.
    ///
    /// Validation is advisory: it is invoked explicitly through
    /// [`ModelExt::validate`], never automatically on write. The default is
    /// an empty schema that accepts any document.
    fn schema() -> Schema {
        Schema::new()
    }
}

/// Extension trait providing conversion and validation utilities for models.
///
/// This trait is automatically implemented for all types that implement [`Model`].
pub trait ModelExt: Model {
    /// Converts this model to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the model does not
    /// serialize to a document.
    fn to_document(&self) -> ModelResult<Document>;

    /// Creates a model from a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: Document) -> ModelResult<Self>;

    /// Converts this model to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> ModelResult<Value>;

    /// Creates a model from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> ModelResult<Self>;

    /// Validates this model against its declared schema.
    ///
    /// The outcome is a structured [`Validation`] value carrying field-level
    /// errors on mismatch; validation never aborts the caller.
    fn validate(&self) -> ModelResult<Validation>;
}

impl<M: Model> ModelExt for M {
    fn to_document(&self) -> ModelResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(doc) => Ok(doc),
            _ => Err(ModelError::Serialization(
                "model did not serialize to a top-level document".to_string(),
            )),
        }
    }

    fn from_document(document: Document) -> ModelResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> ModelResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> ModelResult<Self> {
        Ok(from_value(value)?)
    }

    fn validate(&self) -> ModelResult<Validation> {
        Ok(Self::schema().validate(&self.to_document()?))
    }
}

/// Parses a caller-supplied string into an [`ObjectId`].
///
/// Malformed input (wrong length or non-hex characters) fails with
/// [`ModelError::InvalidId`], which rejects the operation carrying the id.
pub fn parse_object_id(id: &str) -> ModelResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|err| ModelError::InvalidId(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Kitten {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        name: String,
    }

    impl Model for Kitten {
        fn id(&self) -> Option<&ObjectId> {
            self.id.as_ref()
        }

        fn collection_name() -> &'static str {
            "kittens"
        }
    }

    #[test]
    fn document_round_trip_preserves_identity() {
        let id = ObjectId::new();
        let kitten = Kitten { id: Some(id), name: "Ren".to_string() };

        let doc = kitten.to_document().unwrap();
        assert_eq!(doc.get_object_id("_id").unwrap(), id);

        let back = Kitten::from_document(doc).unwrap();
        assert_eq!(back.id(), Some(&id));
        assert_eq!(back.name, "Ren");
    }

    #[test]
    fn unassigned_identity_is_omitted_from_the_document() {
        let kitten = Kitten { id: None, name: "Stimpy".to_string() };
        let doc = kitten.to_document().unwrap();
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn parse_object_id_accepts_well_formed_input() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn parse_object_id_rejects_malformed_input() {
        assert!(matches!(parse_object_id("54321"), Err(ModelError::InvalidId(_))));
        assert!(matches!(parse_object_id("not-a-hex-string-at-all!!"), Err(ModelError::InvalidId(_))));
    }

    #[test]
    fn from_document_rejects_mismatched_shape() {
        let doc = doc! { "name": 42 };
        assert!(Kitten::from_document(doc).is_err());
    }
}
