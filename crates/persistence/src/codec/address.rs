//! Shipping address kept in two shapes: the `shippingAddress` composite and
//! the flat `address`/`ward`/`district`/`province` fields.

use serde_json::{Map, Value};
use tracing::warn;

use super::scalar::parse_text;
use crate::schema::{EntitySchema, FieldSpec, FieldType};
use crate::types::Record;

fn parts(schema: &EntitySchema) -> impl Iterator<Item = (&FieldSpec, &'static str)> {
    schema.fields.iter().filter_map(|field| match field.ty {
        FieldType::AddressPart(key) => Some((field, key)),
        _ => None,
    })
}

fn composite_field(schema: &EntitySchema) -> Option<&FieldSpec> {
    schema
        .fields
        .iter()
        .find(|field| field.ty == FieldType::Address)
}

/// Reads a composite from an embedded object or a JSON-encoded string.
pub(crate) fn parse_composite(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) if !text.trim().is_empty() => {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Some(map),
                _ => {
                    warn!("Malformed shipping address, rebuilding it from flat fields");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Normalizes a composite so that every component is a string or absent.
fn clean(composite: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();
    let street = composite
        .get("street")
        .and_then(parse_text)
        .unwrap_or_default();
    cleaned.insert("street".to_string(), Value::String(street));
    for key in ["ward", "district", "province"] {
        if let Some(text) = composite.get(key).and_then(parse_text) {
            if !text.is_empty() {
                cleaned.insert(key.to_string(), Value::String(text));
            }
        }
    }
    cleaned
}

fn flat_text(value: Option<&Value>) -> Option<String> {
    value.and_then(parse_text).filter(|text| !text.is_empty())
}

/// Fills both address shapes of a decoded record from whichever is present.
///
/// A stored composite wins; otherwise it is rebuilt from the flat fields.
/// Flat fields that are missing are then copied from the composite.
pub(crate) fn expose_both(schema: &EntitySchema, raw: &Record, out: &mut Record) {
    let Some(composite) = composite_field(schema) else {
        return;
    };

    let mut merged = raw
        .get(composite.name)
        .and_then(parse_composite)
        .unwrap_or_default();
    for (field, key) in parts(schema) {
        if !merged.contains_key(key) {
            if let Some(text) = flat_text(raw.get(field.name)) {
                merged.insert(key.to_string(), Value::String(text));
            }
        }
    }
    let merged = clean(&merged);

    for (field, key) in parts(schema) {
        let flat = flat_text(raw.get(field.name))
            .map(Value::String)
            .or_else(|| merged.get(key).filter(|v| v.as_str() != Some("")).cloned())
            .unwrap_or(Value::Null);
        out.insert(field.name.to_string(), flat);
    }
    out.insert(composite.name.to_string(), Value::Object(merged));
}

/// Reconciles the two shapes on a write.
///
/// Starting from the current composite (if any), a provided composite replaces
/// it and provided flat fields override single components. When anything
/// address related was provided, both shapes are written in full.
pub(crate) fn sync_for_write(schema: &EntitySchema, changes: &mut Record, current: Option<&Record>) {
    let Some(composite) = composite_field(schema) else {
        return;
    };

    let given_composite = changes.get(composite.name).and_then(parse_composite);
    let touched_parts: Vec<_> = parts(schema)
        .filter(|(field, _)| changes.contains_key(field.name))
        .collect();
    if given_composite.is_none() && touched_parts.is_empty() && current.is_some() {
        changes.remove(composite.name);
        return;
    }

    let mut merged = given_composite
        .or_else(|| {
            current
                .and_then(|record| record.get(composite.name))
                .and_then(parse_composite)
        })
        .unwrap_or_default();
    for (field, key) in touched_parts {
        match flat_text(changes.get(field.name)) {
            Some(text) => merged.insert(key.to_string(), Value::String(text)),
            None => merged.remove(key),
        };
    }
    let merged = clean(&merged);

    for (field, key) in parts(schema) {
        let flat = merged
            .get(key)
            .filter(|v| v.as_str() != Some(""))
            .cloned()
            .unwrap_or(Value::Null);
        changes.insert(field.name.to_string(), flat);
    }
    changes.insert(composite.name.to_string(), Value::Object(merged));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ORDER;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_composite_synthesized_from_flat_fields() {
        let raw = record(json!({"address": "12 Le Loi", "ward": "Ben Nghe", "province": "HCM"}));
        let mut out = Record::new();
        expose_both(&ORDER, &raw, &mut out);
        assert_eq!(
            out["shippingAddress"],
            json!({"street": "12 Le Loi", "ward": "Ben Nghe", "province": "HCM"})
        );
        assert_eq!(out["district"], Value::Null);
        assert_eq!(out["address"], json!("12 Le Loi"));
    }

    #[test]
    fn test_flat_fields_filled_from_composite() {
        let raw = record(json!({"shippingAddress": {"street": "5 Hang Bai", "district": "Hoan Kiem"}}));
        let mut out = Record::new();
        expose_both(&ORDER, &raw, &mut out);
        assert_eq!(out["address"], json!("5 Hang Bai"));
        assert_eq!(out["district"], json!("Hoan Kiem"));
        assert_eq!(out["ward"], Value::Null);
    }

    #[test]
    fn test_write_merges_flat_patch_into_current_composite() {
        let current = record(json!({
            "shippingAddress": {"street": "5 Hang Bai", "district": "Hoan Kiem", "province": "Ha Noi"}
        }));
        let mut changes = record(json!({"ward": "Trang Tien"}));
        sync_for_write(&ORDER, &mut changes, Some(&current));
        assert_eq!(
            changes["shippingAddress"],
            json!({"street": "5 Hang Bai", "ward": "Trang Tien", "district": "Hoan Kiem", "province": "Ha Noi"})
        );
        assert_eq!(changes["province"], json!("Ha Noi"));
    }

    #[test]
    fn test_write_without_address_changes_leaves_it_alone() {
        let current = record(json!({"shippingAddress": {"street": "x"}}));
        let mut changes = record(json!({"status": "shipped"}));
        sync_for_write(&ORDER, &mut changes, Some(&current));
        assert_eq!(changes, record(json!({"status": "shipped"})));
    }
}
