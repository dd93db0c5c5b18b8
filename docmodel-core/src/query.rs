//! Query descriptors: projection and sort adapters plus operation options.
//!
//! Filters, updates, and pipelines are plain BSON documents in the driver's
//! native predicate syntax; this module only contributes the compact string
//! shorthand for projections and sorts and the option structs the verbs take
//! in place of forwarded argument lists.

use bson::{Document, doc};

/// A field-projection spec: either a structured mapping or the compact
/// whitespace-delimited shorthand, where a leading `-` excludes a field.
///
/// # Example
///
/// ```ignore
/// use docmodel::query::Projection;
///
/// let projection = Projection::from("name -secret");
/// assert_eq!(projection.to_document(), bson::doc! { "name": true, "secret": false });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Structured field-name to include/exclude mapping.
    Fields(Document),
    /// Whitespace-delimited shorthand, e.g. `"name -secret"`.
    Compact(String),
}

impl Projection {
    /// Converts this spec into its structured form.
    ///
    /// Pure and idempotent: structured input passes through unchanged, and an
    /// empty shorthand yields an empty mapping.
    pub fn to_document(&self) -> Document {
        match self {
            Projection::Fields(fields) => fields.clone(),
            Projection::Compact(spec) => {
                let mut fields = Document::new();
                for field in spec.split_whitespace() {
                    match field.strip_prefix('-') {
                        Some(excluded) => fields.insert(excluded, false),
                        None => fields.insert(field, true),
                    };
                }
                fields
            }
        }
    }
}

impl From<&str> for Projection {
    fn from(spec: &str) -> Self {
        Projection::Compact(spec.to_string())
    }
}

impl From<String> for Projection {
    fn from(spec: String) -> Self {
        Projection::Compact(spec)
    }
}

impl From<Document> for Projection {
    fn from(fields: Document) -> Self {
        Projection::Fields(fields)
    }
}

/// A sort spec: either a structured mapping (`1` ascending, `-1` descending)
/// or the compact shorthand, where a leading `-` means descending.
#[derive(Debug, Clone, PartialEq)]
pub enum SortSpec {
    /// Structured field-name to direction mapping.
    Fields(Document),
    /// Whitespace-delimited shorthand, e.g. `"-created_at name"`.
    Compact(String),
}

impl SortSpec {
    /// Converts this spec into its structured form.
    ///
    /// Pure and idempotent, like [`Projection::to_document`].
    pub fn to_document(&self) -> Document {
        match self {
            SortSpec::Fields(fields) => fields.clone(),
            SortSpec::Compact(spec) => {
                let mut fields = Document::new();
                for field in spec.split_whitespace() {
                    match field.strip_prefix('-') {
                        Some(descending) => fields.insert(descending, -1),
                        None => fields.insert(field, 1),
                    };
                }
                fields
            }
        }
    }
}

impl From<&str> for SortSpec {
    fn from(spec: &str) -> Self {
        SortSpec::Compact(spec.to_string())
    }
}

impl From<String> for SortSpec {
    fn from(spec: String) -> Self {
        SortSpec::Compact(spec)
    }
}

impl From<Document> for SortSpec {
    fn from(fields: Document) -> Self {
        SortSpec::Fields(fields)
    }
}

/// Options for a find operation.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
    /// Sort order, structured form.
    pub sort: Option<Document>,
    /// Projection, structured form.
    pub projection: Option<Document>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of documents to return.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of matching documents to skip.
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the sort order from a structured mapping or compact shorthand.
    pub fn with_sort(mut self, sort: impl Into<SortSpec>) -> Self {
        self.sort = Some(sort.into().to_document());
        self
    }

    /// Sets the projection from a structured mapping or compact shorthand.
    pub fn with_projection(mut self, projection: impl Into<Projection>) -> Self {
        self.projection = Some(projection.into().to_document());
        self
    }
}

/// Options for update, replace, and find-and-modify operations.
///
/// `return_updated` selects whether find-and-modify verbs hand back the
/// post-mutation document (the default) or the original.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Insert the document when the filter matches nothing.
    pub upsert: bool,
    /// Return the updated document rather than the original.
    pub return_updated: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self { upsert: false, return_updated: true }
    }
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the document when the filter matches nothing.
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Selects the original document instead of the updated one.
    pub fn return_original(mut self) -> Self {
        self.return_updated = false;
        self
    }
}

/// Specification of a single index to create on a collection.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    /// Indexed keys and their directions.
    pub keys: Document,
    /// Enforce uniqueness across the collection.
    pub unique: bool,
    /// Optional explicit index name.
    pub name: Option<String>,
}

impl IndexSpec {
    /// An ascending single-field index.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { keys: doc! { field.into(): 1 }, unique: false, name: None }
    }

    /// Creates an index spec over the given key document.
    pub fn new(keys: Document) -> Self {
        Self { keys, unique: false, name: None }
    }

    /// Enforces uniqueness.
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Names the index explicitly.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The effective index name: the explicit name if set, otherwise the
    /// conventional `field_direction` form derived from the keys.
    pub fn index_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .keys
                .iter()
                .map(|(field, direction)| format!("{field}_{direction}"))
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_shorthand_maps_to_include_exclude_booleans() {
        let projection = Projection::from("one -two three");
        assert_eq!(
            projection.to_document(),
            doc! { "one": true, "two": false, "three": true }
        );
    }

    #[test]
    fn empty_projection_shorthand_yields_an_empty_mapping() {
        assert_eq!(Projection::from("").to_document(), Document::new());
    }

    #[test]
    fn projection_is_idempotent_on_structured_input() {
        let fields = doc! { "one": true, "two": false };
        assert_eq!(Projection::from(fields.clone()).to_document(), fields);
    }

    #[test]
    fn sort_shorthand_maps_to_directions() {
        let sort = SortSpec::from("one -two three");
        assert_eq!(sort.to_document(), doc! { "one": 1, "two": -1, "three": 1 });
    }

    #[test]
    fn empty_sort_shorthand_yields_an_empty_mapping() {
        assert_eq!(SortSpec::from("").to_document(), Document::new());
    }

    #[test]
    fn sort_is_idempotent_on_structured_input() {
        let fields = doc! { "created_at": -1 };
        assert_eq!(SortSpec::from(fields.clone()).to_document(), fields);
    }

    #[test]
    fn shorthand_tolerates_extra_whitespace() {
        let sort = SortSpec::from("  one   -two ");
        assert_eq!(sort.to_document(), doc! { "one": 1, "two": -1 });
    }

    #[test]
    fn update_options_default_to_returning_the_updated_document() {
        let options = UpdateOptions::default();
        assert!(options.return_updated);
        assert!(!options.upsert);
    }
}
