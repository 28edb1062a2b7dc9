//! Conversion between canonical records and each backend's storage shape.
//!
//! Records handed to the adapters are canonical JSON objects keyed by camelCase
//! field names. The codec turns their values into what a backend stores and
//! back again:
//!
//! | Field type      | [`JsonText`]        | [`Embedded`]        | [`Cells`]           |
//! |-----------------|---------------------|---------------------|---------------------|
//! | tags, items     | JSON text           | native array        | JSON text           |
//! | line items      | JSON text           | array of objects    | JSON text           |
//! | address         | not stored          | embedded object     | not stored          |
//! | number, boolean | native              | native              | string              |
//! | timestamp       | epoch seconds       | epoch seconds       | RFC 3339 string     |
//!
//! Decoding never fails. Malformed composites become empty collections and a
//! warning is logged; unparseable scalars fall back to the field default.
//! Item lists are reduced to their display names for the flat shapes and keep
//! their structure for the document shape.
//!
//! [`JsonText`]: StorageShape::JsonText
//! [`Embedded`]: StorageShape::Embedded
//! [`Cells`]: StorageShape::Cells

mod address;
mod list;
mod scalar;

use serde_json::Value;
use tracing::warn;

use crate::schema::{self, EntitySchema, FieldSpec, FieldType};
use crate::types::Record;

pub(crate) use list::parse_list;
pub(crate) use scalar::{parse_bool, parse_number, parse_text, parse_timestamp};

/// Native storage shape of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageShape {
    /// Typed columns with composites serialized to JSON text.
    JsonText,
    /// Documents with composites embedded natively.
    Embedded,
    /// Flat string cells.
    Cells,
}

impl StorageShape {
    /// Returns `true` if the shape stores the address composite.
    pub fn stores_address(self) -> bool {
        self == StorageShape::Embedded
    }
}

fn to_json_text(items: Vec<Value>) -> Value {
    Value::String(Value::Array(items).to_string())
}

fn empty_cell(field: &FieldSpec, shape: StorageShape) -> Value {
    match shape {
        StorageShape::Cells => Value::String(String::new()),
        _ => default_value(field),
    }
}

/// Encodes one canonical value into the backend's storage shape.
pub fn encode_field(field: &FieldSpec, value: &Value, shape: StorageShape) -> Value {
    use StorageShape::*;

    if value.is_null() && !field.ty.is_composite() {
        return if field.nullable {
            match shape {
                Cells => Value::String(String::new()),
                _ => Value::Null,
            }
        } else {
            empty_cell(field, shape)
        };
    }

    match (field.ty, shape) {
        (FieldType::Tags, Embedded) => Value::Array(list::tags(field.name, value)),
        (FieldType::Tags, _) => to_json_text(list::tags(field.name, value)),
        (FieldType::Items, Embedded) => Value::Array(list::items(field.name, value)),
        (FieldType::Items, _) => to_json_text(list::items(field.name, value)),
        (FieldType::LineItems, Embedded) => Value::Array(list::line_items(field.name, value)),
        (FieldType::LineItems, _) => to_json_text(list::line_items(field.name, value)),
        (FieldType::Address, Embedded) => address::parse_composite(value)
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Default::default())),
        (FieldType::Address, _) => Value::Null,
        (FieldType::Number, Cells) => scalar::parse_number(value)
            .map(|n| Value::String(n.to_string()))
            .unwrap_or_else(|| empty_cell(field, shape)),
        (FieldType::Number, _) => scalar::parse_number(value)
            .map(scalar::number_value)
            .unwrap_or_else(|| default_value(field)),
        (FieldType::Integer, Cells) => scalar::parse_integer(value)
            .map(|n| Value::String(n.to_string()))
            .unwrap_or_else(|| empty_cell(field, shape)),
        (FieldType::Integer, _) => scalar::parse_integer(value)
            .map(Value::from)
            .unwrap_or_else(|| default_value(field)),
        (FieldType::Boolean, Cells) => {
            let flag = scalar::parse_bool(value).unwrap_or(false);
            Value::String(if flag { "TRUE" } else { "FALSE" }.to_string())
        }
        (FieldType::Boolean, _) => Value::Bool(scalar::parse_bool(value).unwrap_or(false)),
        (FieldType::Timestamp, Cells) => scalar::parse_timestamp(value)
            .map(|ts| Value::String(scalar::format_timestamp(ts)))
            .unwrap_or_else(|| empty_cell(field, shape)),
        (FieldType::Timestamp, _) => scalar::parse_timestamp(value)
            .map(Value::from)
            .unwrap_or_else(|| default_value(field)),
        (FieldType::Choice(allowed), _) => {
            Value::String(choice_or_default(field.name, value, allowed).to_string())
        }
        (FieldType::Text | FieldType::AddressPart(_), _) => scalar::parse_text(value)
            .map(Value::String)
            .unwrap_or_else(|| empty_cell(field, shape)),
    }
}

fn choice_or_default(name: &str, value: &Value, allowed: &'static [&'static str]) -> &'static str {
    let default = allowed.first().copied().unwrap_or_default();
    if value.is_null() {
        return default;
    }
    scalar::parse_choice(value, allowed).unwrap_or_else(|| {
        warn!(field = %name, value = %value, default = %default, "Unknown value, using default");
        default
    })
}

/// The value a field decodes to when nothing usable is stored.
pub fn default_value(field: &FieldSpec) -> Value {
    match field.ty {
        _ if field.nullable => Value::Null,
        FieldType::Text => Value::String(String::new()),
        FieldType::Number => scalar::number_value(0.0),
        FieldType::Integer | FieldType::Timestamp => Value::from(0),
        FieldType::Boolean => Value::Bool(false),
        FieldType::Tags | FieldType::Items | FieldType::LineItems => Value::Array(Vec::new()),
        FieldType::Address => Value::Object(Default::default()),
        FieldType::AddressPart(_) => Value::Null,
        FieldType::Choice(allowed) => {
            Value::String(allowed.first().copied().unwrap_or_default().to_string())
        }
    }
}

/// Decodes one stored value into its canonical form.
pub fn decode_field(field: &FieldSpec, value: Option<&Value>, shape: StorageShape) -> Value {
    let value = match value {
        None | Some(Value::Null) => return default_value(field),
        Some(Value::String(s)) if s.is_empty() && shape == StorageShape::Cells => {
            return default_value(field);
        }
        Some(value) => value,
    };

    match field.ty {
        FieldType::Text | FieldType::AddressPart(_) => scalar::parse_text(value)
            .map(Value::String)
            .unwrap_or_else(|| default_value(field)),
        FieldType::Number => scalar::parse_number(value)
            .map(scalar::number_value)
            .unwrap_or_else(|| default_value(field)),
        FieldType::Integer => scalar::parse_integer(value)
            .map(Value::from)
            .unwrap_or_else(|| default_value(field)),
        FieldType::Boolean => Value::Bool(scalar::parse_bool(value).unwrap_or(false)),
        FieldType::Timestamp => scalar::parse_timestamp(value)
            .map(Value::from)
            .unwrap_or_else(|| default_value(field)),
        FieldType::Choice(allowed) => {
            Value::String(choice_or_default(field.name, value, allowed).to_string())
        }
        FieldType::Tags => Value::Array(list::tags(field.name, value)),
        FieldType::Items if shape == StorageShape::Embedded => {
            Value::Array(list::items(field.name, value))
        }
        FieldType::Items => Value::Array(list::item_names(field.name, value)),
        FieldType::LineItems => Value::Array(list::line_items(field.name, value)),
        FieldType::Address => address::parse_composite(value)
            .map(Value::Object)
            .unwrap_or_else(|| default_value(field)),
    }
}

/// Encodes the fields present in `record`. Unknown keys are dropped, and so
/// is the address composite for shapes that do not store it.
pub fn encode_record(schema: &EntitySchema, record: &Record, shape: StorageShape) -> Record {
    let mut encoded = Record::new();
    if let Some(id) = record.get(schema::ID).and_then(scalar::parse_text) {
        encoded.insert(schema::ID.to_string(), Value::String(id));
    }
    for field in schema.all_fields() {
        if field.ty == FieldType::Address && !shape.stores_address() {
            continue;
        }
        if let Some(value) = record.get(field.name) {
            encoded.insert(field.name.to_string(), encode_field(field, value, shape));
        }
    }
    encoded
}

/// Decodes a stored record into the full canonical shape. Every schema field
/// is present in the result.
pub fn decode_record(schema: &EntitySchema, raw: &Record, shape: StorageShape) -> Record {
    let mut record = Record::new();
    let id = raw
        .get(schema::ID)
        .and_then(scalar::parse_text)
        .unwrap_or_default();
    record.insert(schema::ID.to_string(), Value::String(id));

    for field in schema.all_fields() {
        if matches!(field.ty, FieldType::Address | FieldType::AddressPart(_)) {
            continue;
        }
        record.insert(
            field.name.to_string(),
            decode_field(field, raw.get(field.name), shape),
        );
    }
    address::expose_both(schema, raw, &mut record);
    record
}

/// Prepares a new record for insertion: drops caller-supplied identity and
/// bookkeeping, fills defaults for absent fields and reconciles the address.
pub fn prepare_new(schema: &EntitySchema, mut record: Record) -> Record {
    record.remove(schema::ID);
    record.remove("_id");
    address::sync_for_write(schema, &mut record, None);
    for field in schema.fields {
        if !record.contains_key(field.name) {
            record.insert(field.name.to_string(), default_value(field));
        }
    }
    record.retain(|key, _| schema.fields.iter().any(|field| field.name == key));
    record
}

/// Prepares a partial update against the current canonical record. Only the
/// provided keys are kept, plus the address fields they imply.
pub fn prepare_changes(schema: &EntitySchema, current: &Record, mut changes: Record) -> Record {
    address::sync_for_write(schema, &mut changes, Some(current));
    changes.retain(|key, _| schema.fields.iter().any(|field| field.name == key));
    changes
}
