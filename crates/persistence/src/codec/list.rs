//! Tag lists, item lists and order line items.

use serde_json::{Map, Value};
use tracing::warn;

use super::scalar::{number_value, parse_integer, parse_number, parse_text};
use crate::error::ValidationError;

/// Reads a list from a native array, a JSON-encoded string (possibly encoded
/// twice by legacy writers) or null.
pub(crate) fn parse_list(field: &str, value: &Value) -> Result<Vec<Value>, ValidationError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items.clone()),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(Vec::new());
            }
            match serde_json::from_str::<Value>(text) {
                Ok(Value::String(inner)) => parse_list(field, &Value::String(inner)),
                Ok(Value::Array(items)) => Ok(items),
                Ok(Value::Null) => Ok(Vec::new()),
                Ok(other) => Err(malformed(field, format!("expected a list, got {other}"))),
                Err(e) => Err(malformed(field, e.to_string())),
            }
        }
        other => Err(malformed(field, format!("expected a list, got {other}"))),
    }
}

fn malformed(field: &str, message: String) -> ValidationError {
    ValidationError::MalformedInput {
        field: field.to_string(),
        message,
    }
}

/// Like [`parse_list`], but recovers from malformed input with an empty list.
pub(crate) fn read_list(field: &str, value: &Value) -> Vec<Value> {
    parse_list(field, value).unwrap_or_else(|e| {
        warn!(field = %field, error = %e, "Malformed list value, using an empty list");
        Vec::new()
    })
}

fn item_name(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => map.get("name").and_then(parse_text),
        other => parse_text(other),
    }
    .filter(|name| !name.trim().is_empty())
}

/// Normalizes a tag list to non-empty strings.
pub(crate) fn tags(field: &str, value: &Value) -> Vec<Value> {
    read_list(field, value)
        .iter()
        .filter_map(item_name)
        .map(Value::String)
        .collect()
}

/// Normalizes an item list, keeping structured entries intact.
pub(crate) fn items(field: &str, value: &Value) -> Vec<Value> {
    read_list(field, value)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) if map.get("name").and_then(Value::as_str).is_some() => {
                Some(Value::Object(map))
            }
            other => item_name(&other).map(Value::String),
        })
        .collect()
}

/// Reduces an item list to the display names of its entries.
pub(crate) fn item_names(field: &str, value: &Value) -> Vec<Value> {
    items(field, value)
        .iter()
        .filter_map(item_name)
        .map(Value::String)
        .collect()
}

/// Normalizes order line items to the canonical keys, filling a missing
/// `lineTotal` from price and quantity.
pub(crate) fn line_items(field: &str, value: &Value) -> Vec<Value> {
    read_list(field, value)
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(Value::Object(line_item(&map))),
            _ => None,
        })
        .collect()
}

fn line_item(raw: &Map<String, Value>) -> Map<String, Value> {
    let pick = |keys: &[&str]| keys.iter().find_map(|key| raw.get(*key));

    let product_id = pick(&["productId", "product", "id"])
        .and_then(parse_text)
        .unwrap_or_default();
    let product_name = pick(&["productName", "name"])
        .and_then(parse_text)
        .unwrap_or_default();
    let quantity = pick(&["quantity", "qty"])
        .and_then(parse_integer)
        .unwrap_or(0)
        .max(0);
    let price = pick(&["price"]).and_then(parse_number).unwrap_or(0.0);
    let line_total = pick(&["lineTotal", "total"])
        .and_then(parse_number)
        .unwrap_or(price * quantity as f64);

    let mut item = Map::new();
    item.insert("productId".to_string(), Value::String(product_id));
    item.insert("productName".to_string(), Value::String(product_name));
    item.insert("quantity".to_string(), Value::from(quantity));
    item.insert("price".to_string(), number_value(price));
    item.insert("lineTotal".to_string(), number_value(line_total));
    item
}
