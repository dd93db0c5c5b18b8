//! Raw driver reply shapes and the result normalizer.
//!
//! Drivers return their results as a tagged [`RawReply`] union so the
//! normalizer dispatches on an explicit tag instead of probing values for
//! field presence. [`normalize`] classifies a reply and wraps it into typed
//! model instances, a single instance, nothing, or an untouched raw value.

use bson::{Bson, Document};

use crate::{
    document::{Model, ModelExt},
    error::ModelResult,
};

/// The find-and-modify wrapper: the applied document, if any, under `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationReply {
    /// The pre- or post-mutation document; `None` signals "no match".
    pub value: Option<Document>,
}

impl MutationReply {
    /// A reply carrying an applied document.
    pub fn applied(value: Document) -> Self {
        Self { value: Some(value) }
    }

    /// A reply signalling that no document matched.
    pub fn no_match() -> Self {
        Self { value: None }
    }
}

/// The insert wrapper: the inserted documents, identity assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReply {
    /// The documents as written, in insertion order.
    pub inserted: Vec<Document>,
}

impl WriteReply {
    pub fn new(inserted: Vec<Document>) -> Self {
        Self { inserted }
    }
}

/// A raw driver reply, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawReply {
    /// A list of raw documents (find, aggregate).
    Documents(Vec<Document>),
    /// A find-and-modify wrapper.
    Mutation(MutationReply),
    /// An insert wrapper.
    Write(WriteReply),
    /// A single bare document.
    Document(Document),
    /// Anything else; passed through unchanged.
    Raw(Bson),
}

impl From<MutationReply> for RawReply {
    fn from(reply: MutationReply) -> Self {
        RawReply::Mutation(reply)
    }
}

impl From<WriteReply> for RawReply {
    fn from(reply: WriteReply) -> Self {
        RawReply::Write(reply)
    }
}

/// The normalized, typed form of a driver reply.
#[derive(Debug, Clone)]
pub enum Outcome<M> {
    /// A list of model instances, order preserved.
    Many(Vec<M>),
    /// Exactly one model instance.
    One(M),
    /// An empty result: the operation matched nothing.
    Nothing,
    /// A value the normalizer left untouched.
    Raw(Bson),
}

impl<M> Outcome<M> {
    /// Interprets this outcome as an optional single instance.
    ///
    /// `Nothing` and raw nulls map to `None`; a list yields its first element.
    pub fn into_one(self) -> Option<M> {
        match self {
            Outcome::One(model) => Some(model),
            Outcome::Many(models) => models.into_iter().next(),
            Outcome::Nothing | Outcome::Raw(_) => None,
        }
    }

    /// Interprets this outcome as a list of instances.
    pub fn into_many(self) -> Vec<M> {
        match self {
            Outcome::Many(models) => models,
            Outcome::One(model) => vec![model],
            Outcome::Nothing | Outcome::Raw(_) => Vec::new(),
        }
    }
}

/// Classifies a raw reply and wraps it into typed records.
///
/// Classification follows the shape rules, in order: document list, mutation
/// wrapper, write wrapper, identity-bearing single document, raw
/// pass-through. A single document without an `_id` field is not wrapped; it
/// comes back unchanged as [`Outcome::Raw`]. Driver errors never reach this
/// function; they are propagated upstream before normalization.
pub fn normalize<M: Model>(reply: RawReply) -> ModelResult<Outcome<M>> {
    match reply {
        RawReply::Documents(docs) => Ok(Outcome::Many(
            docs.into_iter()
                .map(M::from_document)
                .collect::<ModelResult<Vec<M>>>()?,
        )),
        RawReply::Mutation(MutationReply { value: Some(doc) }) => {
            Ok(Outcome::One(M::from_document(doc)?))
        }
        RawReply::Mutation(MutationReply { value: None }) => Ok(Outcome::Nothing),
        RawReply::Write(WriteReply { inserted }) => Ok(Outcome::Many(
            inserted
                .into_iter()
                .map(M::from_document)
                .collect::<ModelResult<Vec<M>>>()?,
        )),
        RawReply::Document(doc) => {
            if doc.contains_key("_id") {
                Ok(Outcome::One(M::from_document(doc)?))
            } else {
                Ok(Outcome::Raw(Bson::Document(doc)))
            }
        }
        RawReply::Raw(value) => Ok(Outcome::Raw(value)),
    }
}
