//! Composite field types: tag and item lists, addresses and order line items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured list entry such as an ingredient with a percentage.
///
/// `name` is the display scalar; every other key is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredItem {
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl StructuredItem {
    /// Creates an item with no extra attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
        }
    }

    /// Adds an attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One entry of a benefit or ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Text(String),
    Structured(StructuredItem),
}

impl ListItem {
    /// Returns the display scalar of the entry.
    pub fn name(&self) -> &str {
        match self {
            ListItem::Text(text) => text,
            ListItem::Structured(item) => &item.name,
        }
    }
}

impl From<&str> for ListItem {
    fn from(value: &str) -> Self {
        ListItem::Text(value.to_string())
    }
}

impl From<StructuredItem> for ListItem {
    fn from(value: StructuredItem) -> Self {
        ListItem::Structured(value)
    }
}

/// Caller-supplied value for a list field.
///
/// Callers may hand over a JSON-encoded string (legacy forms), a plain list of
/// strings, or a list of structured items. The codec resolves the variant once
/// when the record is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompositeValue {
    Raw(String),
    Flat(Vec<String>),
    Structured(Vec<ListItem>),
}

impl Default for CompositeValue {
    fn default() -> Self {
        CompositeValue::Flat(Vec::new())
    }
}

impl From<Vec<String>> for CompositeValue {
    fn from(value: Vec<String>) -> Self {
        CompositeValue::Flat(value)
    }
}

impl From<Vec<&str>> for CompositeValue {
    fn from(value: Vec<&str>) -> Self {
        CompositeValue::Flat(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<ListItem>> for CompositeValue {
    fn from(value: Vec<ListItem>) -> Self {
        CompositeValue::Structured(value)
    }
}

impl From<&str> for CompositeValue {
    fn from(value: &str) -> Self {
        CompositeValue::Raw(value.to_string())
    }
}

/// A shipping address as an embedded composite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

impl Address {
    /// Creates an address from a street line.
    pub fn new(street: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            ..Default::default()
        }
    }

    /// Returns `true` when no component is filled in.
    pub fn is_empty(&self) -> bool {
        self.street.is_empty()
            && self.ward.is_none()
            && self.district.is_none()
            && self.province.is_none()
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(alias = "product")]
    pub product_id: String,
    #[serde(default, alias = "name")]
    pub product_name: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(alias = "total")]
    pub line_total: f64,
}

impl LineItem {
    /// Creates a line item, computing `line_total` from price and quantity.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: u32,
        price: f64,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            price,
            line_total: price * f64::from(quantity),
        }
    }
}
