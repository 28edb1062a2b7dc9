//! Conversion between canonical records and BSON documents.

use mongodb::bson::{self, Bson, DateTime, Document};
use serde_json::Value;

use crate::codec::{self, StorageShape};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::identity;
use crate::schema::{self, EntitySchema, FieldSpec, FieldType};
use crate::types::Record;

pub(crate) const SHAPE: StorageShape = StorageShape::Embedded;

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

/// Converts an encoded field value into BSON. Timestamps become native dates.
pub(crate) fn field_to_bson(field: &FieldSpec, value: &Value) -> StorageResult<Bson> {
    if field.ty == FieldType::Timestamp {
        if let Some(seconds) = value.as_i64() {
            return Ok(Bson::DateTime(DateTime::from_millis(seconds.saturating_mul(1000))));
        }
    }
    bson::to_bson(value).map_err(|e| serialization_error(e.to_string()))
}

/// Encodes the fields present in a canonical record as a document.
pub(crate) fn to_document(schema: &EntitySchema, record: &Record) -> StorageResult<Document> {
    let encoded = codec::encode_record(schema, record, SHAPE);
    let mut document = Document::new();
    for field in schema.all_fields() {
        if let Some(value) = encoded.get(field.name) {
            document.insert(field.name, field_to_bson(field, value)?);
        }
    }
    Ok(document)
}

/// Converts stored BSON into JSON. Dates become epoch seconds and ObjectIds
/// their hex string.
pub(crate) fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(date) => Value::from(date.timestamp_millis().div_euclid(1000)),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(values) => Value::Array(values.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Decodes a stored document into a canonical record. A non-empty `id`
/// field wins over the native `_id`.
pub(crate) fn from_document(schema: &EntitySchema, document: Document) -> Record {
    let mut raw: Record = document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();

    let id = raw
        .get(schema::ID)
        .and_then(identity::normalize_id)
        .or_else(|| raw.get("_id").and_then(identity::normalize_id));
    if let Some(id) = id {
        raw.insert(schema::ID.to_string(), Value::String(id));
    }

    codec::decode_record(schema, &raw, SHAPE)
}
