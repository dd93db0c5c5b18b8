//! Declarative schema validation for model documents.
//!
//! A [`Schema`] is a set of named field rules checked against a BSON document.
//! Validation is advisory and explicit: the storage layer enforces no shape,
//! and the outcome is the [`Validation`] sum type carrying field-level errors,
//! never an `Err` or a panic used for control flow.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// The expected BSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// 32- or 64-bit integer.
    Int,
    /// 64-bit float (also accepts integers).
    Double,
    /// Boolean.
    Bool,
    /// Array of arbitrary values.
    Array,
    /// Embedded document.
    Document,
    /// 12-byte object identifier.
    ObjectId,
    /// BSON datetime.
    DateTime,
    /// Any value; only presence is checked.
    Any,
}

impl FieldType {
    fn matches(&self, value: &Bson) -> bool {
        match self {
            FieldType::String => matches!(value, Bson::String(_)),
            FieldType::Int => matches!(value, Bson::Int32(_) | Bson::Int64(_)),
            FieldType::Double => {
                matches!(value, Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_))
            }
            FieldType::Bool => matches!(value, Bson::Boolean(_)),
            FieldType::Array => matches!(value, Bson::Array(_)),
            FieldType::Document => matches!(value, Bson::Document(_)),
            FieldType::ObjectId => matches!(value, Bson::ObjectId(_)),
            FieldType::DateTime => matches!(value, Bson::DateTime(_)),
            FieldType::Any => true,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::Array => "array",
            FieldType::Document => "document",
            FieldType::ObjectId => "object id",
            FieldType::DateTime => "datetime",
            FieldType::Any => "any",
        }
    }
}

/// A validation rule for a single named field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    field_type: FieldType,
    required: bool,
    min_len: Option<usize>,
    max_len: Option<usize>,
}

impl FieldRule {
    /// Creates an optional rule for the given type.
    pub fn optional(field_type: FieldType) -> Self {
        Self { field_type, required: false, min_len: None, max_len: None }
    }

    /// Creates a required rule for the given type.
    pub fn required(field_type: FieldType) -> Self {
        Self { field_type, required: true, min_len: None, max_len: None }
    }

    /// Sets a minimum length for string or array values.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = Some(min_len);
        self
    }

    /// Sets a maximum length for string or array values.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    fn check(&self, field: &str, value: &Bson, errors: &mut Vec<FieldError>) {
        if !self.field_type.matches(value) {
            errors.push(FieldError::new(
                field,
                format!("expected {}", self.field_type.name()),
            ));
            return;
        }

        let len = match value {
            Bson::String(s) => Some(s.chars().count()),
            Bson::Array(arr) => Some(arr.len()),
            _ => None,
        };

        if let Some(len) = len {
            if let Some(min) = self.min_len {
                if len < min {
                    errors.push(FieldError::new(field, format!("shorter than minimum length {min}")));
                }
            }
            if let Some(max) = self.max_len {
                if len > max {
                    errors.push(FieldError::new(field, format!("longer than maximum length {max}")));
                }
            }
        }
    }
}

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The offending field name.
    pub field: String,
    /// Human-readable description of the mismatch.
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self { field: field.to_string(), message: message.into() }
    }
}

/// The outcome of validating a document against a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validation {
    /// The document satisfies every rule.
    Valid,
    /// One or more field-level mismatches.
    Invalid(Vec<FieldError>),
}

impl Validation {
    /// Returns true when the document satisfied every rule.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Returns the field-level errors, empty when valid.
    pub fn errors(&self) -> &[FieldError] {
        match self {
            Validation::Valid => &[],
            Validation::Invalid(errors) => errors,
        }
    }
}

/// A declarative validation schema: named field rules plus an unknown-field policy.
///
/// # Example
///
/// ```ignore
/// use docmodel::schema::{Schema, FieldRule, FieldType};
///
/// let schema = Schema::new()
///     .field("name", FieldRule::required(FieldType::String).with_min_len(1))
///     .field("age", FieldRule::optional(FieldType::Int));
///
/// let outcome = schema.validate(&bson::doc! { "name": "Ren" });
/// assert!(outcome.is_valid());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<(String, FieldRule)>,
    deny_unknown: bool,
}

impl Schema {
    /// Creates an empty schema that accepts any document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for a named field.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push((name.into(), rule));
        self
    }

    /// Rejects fields that have no rule. `_id` is always allowed.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown = true;
        self
    }

    /// Validates a document against this schema.
    pub fn validate(&self, document: &Document) -> Validation {
        let mut errors = Vec::new();

        for (name, rule) in &self.fields {
            match document.get(name) {
                Some(Bson::Null) | None => {
                    if rule.required {
                        errors.push(FieldError::new(name, "is required"));
                    }
                }
                Some(value) => rule.check(name, value, &mut errors),
            }
        }

        if self.deny_unknown {
            for key in document.keys() {
                if key != "_id" && !self.fields.iter().any(|(name, _)| name == key) {
                    errors.push(FieldError::new(key, "is not allowed"));
                }
            }
        }

        if errors.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn kitten_schema() -> Schema {
        Schema::new()
            .field("name", FieldRule::required(FieldType::String).with_min_len(1))
            .field("lives", FieldRule::optional(FieldType::Int))
    }

    #[test]
    fn accepts_a_conforming_document() {
        let outcome = kitten_schema().validate(&doc! { "name": "Ren", "lives": 9 });
        assert!(outcome.is_valid());
        assert!(outcome.errors().is_empty());
    }

    #[test]
    fn reports_missing_required_fields() {
        let outcome = kitten_schema().validate(&doc! { "lives": 9 });
        let errors = outcome.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[0].message, "is required");
    }

    #[test]
    fn reports_type_mismatches_per_field() {
        let outcome = kitten_schema().validate(&doc! { "name": 42, "lives": "nine" });
        let fields: Vec<_> = outcome.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "lives"]);
    }

    #[test]
    fn null_counts_as_absent() {
        let outcome = kitten_schema().validate(&doc! { "name": Bson::Null });
        assert!(!outcome.is_valid());
    }

    #[test]
    fn length_bounds_apply_to_strings() {
        let schema = Schema::new()
            .field("name", FieldRule::required(FieldType::String).with_min_len(2).with_max_len(4));

        assert!(schema.validate(&doc! { "name": "Ren" }).is_valid());
        assert!(!schema.validate(&doc! { "name": "R" }).is_valid());
        assert!(!schema.validate(&doc! { "name": "Stimpy" }).is_valid());
    }

    #[test]
    fn unknown_fields_are_allowed_unless_denied() {
        let open = kitten_schema();
        assert!(open.validate(&doc! { "name": "Ren", "extra": true }).is_valid());

        let closed = kitten_schema().deny_unknown_fields();
        let outcome = closed.validate(&doc! { "name": "Ren", "extra": true });
        assert_eq!(outcome.errors()[0].field, "extra");
    }

    #[test]
    fn empty_schema_accepts_anything() {
        assert!(Schema::new().validate(&doc! { "whatever": [1, 2, 3] }).is_valid());
    }
}
