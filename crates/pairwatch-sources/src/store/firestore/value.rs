//! Conversion between plain JSON and Firestore's typed REST value encoding.

use serde_json::{json, Map, Value};
use crate::error::SourceError;
use crate::traits::{Document, StoredDocument};

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // int64 travels as a string
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

pub fn decode_value(value: &Value) -> Result<Value, SourceError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SourceError::Decode(format!("expected typed value object, got {}", value)))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| SourceError::Decode("empty typed value".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or_default())),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| json!(i))
                .ok_or_else(|| SourceError::Decode(format!("invalid integerValue {}", inner)))
        }
        "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect::<Result<Vec<_>, _>>())
                .transpose()?
                .unwrap_or_default();
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = inner.get("fields").cloned().unwrap_or_else(|| json!({}));
            Ok(Value::Object(decode_fields(&fields)?))
        }
        other => Err(SourceError::Decode(format!("unsupported Firestore value type '{}'", other))),
    }
}

pub fn decode_fields(fields: &Value) -> Result<Document, SourceError> {
    let Some(map) = fields.as_object() else {
        return Ok(Document::new());
    };
    map.iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decode a REST `Document` resource; the id is the last segment of `name`.
pub fn decode_document(resource: &Value) -> Result<StoredDocument, SourceError> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| SourceError::Decode("document without name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = resource.get("fields").map(decode_fields).transpose()?.unwrap_or_default();
    Ok(StoredDocument { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_interaction_document() {
        let doc: Document = serde_json::from_value(json!({
            "userId": "alex",
            "tmdbId": 603,
            "metadata": {"voteAverage": 8.2, "posterPath": null},
            "users": ["alex", "sam"],
            "isActiveMatch": true,
        }))
        .unwrap();

        let encoded = encode_fields(&doc);
        assert_eq!(encoded["userId"], json!({"stringValue": "alex"}));
        assert_eq!(encoded["tmdbId"], json!({"integerValue": "603"}));
        assert_eq!(encoded["metadata"]["mapValue"]["fields"]["voteAverage"], json!({"doubleValue": 8.2}));
        assert_eq!(encoded["metadata"]["mapValue"]["fields"]["posterPath"], json!({"nullValue": null}));
        assert_eq!(
            encoded["users"]["arrayValue"]["values"][1],
            json!({"stringValue": "sam"})
        );
        assert_eq!(encoded["isActiveMatch"], json!({"booleanValue": true}));

        assert_eq!(decode_fields(&encoded).unwrap(), doc);
    }

    #[test]
    fn test_decodes_rest_document_resource() {
        let resource = json!({
            "name": "projects/p/databases/(default)/documents/bundles/b1",
            "fields": {
                "title": {"stringValue": "Cozy"},
                "createdAt": {"timestampValue": "2024-02-01T10:00:00Z"},
                "contentIds": {"arrayValue": {}},
            },
            "createTime": "2024-02-01T10:00:00Z"
        });
        let doc = decode_document(&resource).unwrap();
        assert_eq!(doc.id, "b1");
        assert_eq!(doc.fields["title"], "Cozy");
        assert_eq!(doc.fields["createdAt"], "2024-02-01T10:00:00Z");
        assert_eq!(doc.fields["contentIds"], json!([]));
    }

    #[test]
    fn test_rejects_unknown_value_type() {
        assert!(decode_value(&json!({"fancyValue": 1})).is_err());
    }
}
