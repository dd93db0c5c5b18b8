//! Mongo-syntax evaluation over in-memory BSON documents.
//!
//! This module implements the subset of the query language the memory driver
//! supports: filter matching (implicit equality plus the common comparison,
//! membership, existence, and logical operators), update operators, multi-key
//! sorting, and include/exclude projections.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docmodel_core::error::{ModelError, ModelResult};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so mixed int/double comparisons
/// behave like the real driver's.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(&'a ObjectId),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Tests a document against a Mongo-style filter.
///
/// Top-level `$and`/`$or` take arrays of sub-filters; any other `$`-prefixed
/// top-level key is unsupported. A plain field value means implicit equality;
/// a document value whose first key starts with `$` is an operator set.
pub(crate) fn matches_filter(document: &Document, filter: &Document) -> ModelResult<bool> {
    for (key, value) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let filters = sub_filters(value, "$and")?;
                let mut all = true;
                for sub in filters {
                    if !matches_filter(document, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let filters = sub_filters(value, "$or")?;
                let mut any = false;
                for sub in filters {
                    if matches_filter(document, sub)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            other if other.starts_with('$') => {
                return Err(ModelError::Unsupported(format!(
                    "filter operator {other} is not supported by the memory driver"
                )));
            }
            field => matches_condition(document.get(field), value)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn sub_filters<'a>(value: &'a Bson, op: &str) -> ModelResult<Vec<&'a Document>> {
    match value {
        Bson::Array(items) => items
            .iter()
            .map(|item| {
                item.as_document().ok_or_else(|| {
                    ModelError::Unsupported(format!("{op} expects an array of filter documents"))
                })
            })
            .collect(),
        _ => Err(ModelError::Unsupported(format!(
            "{op} expects an array of filter documents"
        ))),
    }
}

fn matches_condition(field_value: Option<&Bson>, condition: &Bson) -> ModelResult<bool> {
    // A document value whose first key starts with `$` is an operator set;
    // anything else is implicit equality.
    let operators = match condition.as_document() {
        Some(doc) if doc.keys().next().is_some_and(|key| key.starts_with('$')) => doc,
        _ => return Ok(equality(field_value, condition)),
    };

    for (op, operand) in operators {
        if !apply_operator(field_value, op, operand)? {
            return Ok(false);
        }
    }

    Ok(true)
}

fn equality(field_value: Option<&Bson>, operand: &Bson) -> bool {
    match field_value {
        Some(value) => {
            if Comparable::from(value) == Comparable::from(operand) {
                return true;
            }
            // An array field matches when any element equals the operand.
            match value {
                Bson::Array(items) => items
                    .iter()
                    .any(|item| Comparable::from(item) == Comparable::from(operand)),
                _ => false,
            }
        }
        None => matches!(operand, Bson::Null),
    }
}

fn apply_operator(field_value: Option<&Bson>, op: &str, operand: &Bson) -> ModelResult<bool> {
    match op {
        "$eq" => Ok(equality(field_value, operand)),
        "$ne" => Ok(!equality(field_value, operand)),
        "$gt" | "$gte" | "$lt" | "$lte" => {
            let Some(value) = field_value else {
                return Ok(false);
            };
            match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
                Some(ordering) => Ok(match op {
                    "$gt" => ordering == Ordering::Greater,
                    "$gte" => ordering != Ordering::Less,
                    "$lt" => ordering == Ordering::Less,
                    "$lte" => ordering != Ordering::Greater,
                    _ => unreachable!(),
                }),
                None => Ok(false),
            }
        }
        "$in" => match operand {
            Bson::Array(candidates) => Ok(candidates
                .iter()
                .any(|candidate| equality(field_value, candidate))),
            _ => Err(ModelError::Unsupported("$in expects an array".to_string())),
        },
        "$nin" => match operand {
            Bson::Array(candidates) => Ok(!candidates
                .iter()
                .any(|candidate| equality(field_value, candidate))),
            _ => Err(ModelError::Unsupported("$nin expects an array".to_string())),
        },
        "$exists" => {
            let should_exist = operand.as_bool().unwrap_or(true);
            Ok(field_value.is_some() == should_exist)
        }
        "$not" => match operand.as_document() {
            Some(_) => Ok(!matches_condition(field_value, operand)?),
            None => Err(ModelError::Unsupported(
                "$not expects an operator document".to_string(),
            )),
        },
        other => Err(ModelError::Unsupported(format!(
            "filter operator {other} is not supported by the memory driver"
        ))),
    }
}

/// Applies `$set`/`$unset`/`$inc` update operators to a document in place.
///
/// The `_id` field is immutable; attempts to change it are rejected.
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> ModelResult<()> {
    for (op, operand) in update {
        let fields = operand.as_document().ok_or_else(|| {
            ModelError::Unsupported(format!("{op} expects a field document"))
        })?;

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    if field == "_id" {
                        return Err(ModelError::Backend(
                            "the _id field is immutable".to_string(),
                        ));
                    }
                    document.insert(field.clone(), value.clone());
                }
            }
            "$unset" => {
                for (field, _) in fields {
                    if field == "_id" {
                        return Err(ModelError::Backend(
                            "the _id field is immutable".to_string(),
                        ));
                    }
                    document.remove(field);
                }
            }
            "$inc" => {
                for (field, delta) in fields {
                    let current = document.get(field).cloned().unwrap_or(Bson::Int64(0));
                    document.insert(field.clone(), add_numbers(&current, delta)?);
                }
            }
            other => {
                return Err(ModelError::Unsupported(format!(
                    "update operator {other} is not supported by the memory driver"
                )));
            }
        }
    }

    Ok(())
}

fn add_numbers(left: &Bson, right: &Bson) -> ModelResult<Bson> {
    match (left, right) {
        (Bson::Int32(a), Bson::Int32(b)) => Ok(Bson::Int32(a + b)),
        (Bson::Int32(a), Bson::Int64(b)) => Ok(Bson::Int64(*a as i64 + b)),
        (Bson::Int64(a), Bson::Int32(b)) => Ok(Bson::Int64(a + *b as i64)),
        (Bson::Int64(a), Bson::Int64(b)) => Ok(Bson::Int64(a + b)),
        (a, b) => match (number(a), number(b)) {
            (Some(a), Some(b)) => Ok(Bson::Double(a + b)),
            _ => Err(ModelError::Unsupported(
                "$inc expects numeric values".to_string(),
            )),
        },
    }
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Sorts documents by a multi-key sort document (`1` ascending, `-1` descending).
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = a.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
            let right = b.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

            let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            let ordering = if number(direction).unwrap_or(1.0) < 0.0 {
                ordering.reverse()
            } else {
                ordering
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Applies an include/exclude projection to a document.
///
/// Any `true`/`1` entry switches to inclusion mode (keeping `_id` unless it
/// is explicitly excluded); otherwise listed fields are dropped. An empty
/// projection passes the document through.
pub(crate) fn project_document(document: &Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return document.clone();
    }

    let truthy = |value: &Bson| -> bool {
        match value {
            Bson::Boolean(b) => *b,
            other => number(other).is_some_and(|n| n != 0.0),
        }
    };

    let include_mode = projection
        .iter()
        .any(|(field, value)| field != "_id" && truthy(value));

    if include_mode {
        let mut projected = Document::new();
        let id_excluded = projection
            .get("_id")
            .is_some_and(|value| !truthy(value));

        if !id_excluded {
            if let Some(id) = document.get("_id") {
                projected.insert("_id", id.clone());
            }
        }

        for (field, value) in projection {
            if field != "_id" && truthy(value) {
                if let Some(found) = document.get(field) {
                    projected.insert(field.clone(), found.clone());
                }
            }
        }

        projected
    } else {
        let mut projected = document.clone();
        for (field, value) in projection {
            if !truthy(value) {
                projected.remove(field);
            }
        }
        projected
    }
}
