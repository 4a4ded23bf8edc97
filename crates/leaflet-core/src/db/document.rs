//! Mapping between entity shapes and stored documents.
//!
//! Entities expose a single canonical identity field, `id`. Stored documents
//! carry it as `_id`. This module is the only place the two meet.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::models::DocId;

/// A schema-less stored document
pub type Document = Map<String, Value>;

/// Identity field inside stored documents
pub const ID_FIELD: &str = "_id";

const ENTITY_ID_FIELD: &str = "id";

/// Convert a JSON object into a document, failing on any other JSON type.
pub fn into_document(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidInput(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Serialize an entity into its store shape (`id` becomes `_id`).
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    let mut document = into_document(serde_json::to_value(record)?)?;
    match document.remove(ENTITY_ID_FIELD) {
        Some(Value::Null) | None => {}
        Some(id) => {
            document.insert(ID_FIELD.to_string(), id);
        }
    }
    Ok(document)
}

/// Deserialize an entity from its store shape (`_id` becomes `id`).
pub fn from_document<T: DeserializeOwned>(mut document: Document) -> Result<T> {
    if let Some(id) = document.remove(ID_FIELD) {
        document.insert(ENTITY_ID_FIELD.to_string(), id);
    }
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Read the identity of a stored document, if it has a usable one.
pub fn document_id(document: &Document) -> Result<Option<DocId>> {
    match document.get(ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => id.parse().map(Some),
        Some(other) => Err(Error::InvalidInput(format!(
            "document id must be a string, got {other}"
        ))),
    }
}
