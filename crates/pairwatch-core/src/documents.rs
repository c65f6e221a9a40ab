use pairwatch_sources::{Document, SourceError, StoredDocument};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, SourceError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(SourceError::Decode(format!("expected an object, got {}", other))),
    }
}

pub fn from_document<T: DeserializeOwned>(fields: Document) -> Result<T, SourceError> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}

/// Decode every document, skipping (and logging) the ones that don't fit `T`.
pub fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<StoredDocument>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match from_document(doc.fields) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping malformed {} document '{}': {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}
