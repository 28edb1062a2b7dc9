//! Customer orders.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::composite::{Address, LineItem};
use super::validate;
use super::{Entity, EntityKind};
use crate::error::ValidationError;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Storage spellings, default first.
    pub const VALUES: &'static [&'static str] =
        &["pending", "confirmed", "shipped", "delivered", "cancelled"];
}

/// A placed order.
///
/// The shipping address is exposed both as the `shipping_address` composite
/// and as the flat `address`/`ward`/`district`/`province` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub shipping_address: Address,
    pub address: Option<String>,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub total: f64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Order {
    const KIND: EntityKind = EntityKind::Order;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating an order.
///
/// `total` is supplied by the caller and stored as given; use
/// [`NewOrder::items_total`] to compute it from the line items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    /// Sum of the line totals.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|item| item.line_total).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty(EntityKind::Order, "customerName", &self.customer_name)?;
        validate::amount(EntityKind::Order, "total", self.total)?;
        for item in &self.items {
            validate::amount(EntityKind::Order, "items.price", item.price)?;
        }
        Ok(())
    }
}

/// Generates a human-facing order reference such as `ORD-20260116-4F9A2C`.
pub fn generate_order_number() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        Utc::now().format("%Y%m%d"),
        suffix[..6].to_ascii_uppercase()
    )
}

/// Partial update for an order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl OrderPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(total) = self.total {
            validate::amount(EntityKind::Order, "total", total)?;
        }
        Ok(())
    }
}
