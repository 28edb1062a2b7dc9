//! Product records.

use serde::{Deserialize, Serialize};

use super::composite::{CompositeValue, ListItem};
use super::validate;
use super::{Entity, EntityKind};
use crate::error::ValidationError;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount: Option<f64>,
    #[serde(default)]
    pub category: String,
    /// Skin-need tags in display order.
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub hover_image: String,
    pub description: Option<String>,
    pub how_to_use: Option<String>,
    #[serde(default)]
    pub benefits: Vec<ListItem>,
    #[serde(default)]
    pub ingredients: Vec<ListItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub needs: CompositeValue,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub hover_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_use: Option<String>,
    #[serde(default)]
    pub benefits: CompositeValue,
    #[serde(default)]
    pub ingredients: CompositeValue,
}

impl NewProduct {
    /// Checks the fields that must hold before the product is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty(EntityKind::Product, "name", &self.name)?;
        validate::amount(EntityKind::Product, "price", self.price)?;
        if let Some(original) = self.original_price {
            validate::amount(EntityKind::Product, "originalPrice", original)?;
        }
        Ok(())
    }
}

/// Partial update for a product. `None` leaves a field untouched; for
/// nullable fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs: Option<CompositeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_to_use: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<CompositeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<CompositeValue>,
}

impl ProductPatch {
    /// Checks the provided fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate::non_empty(EntityKind::Product, "name", name)?;
        }
        if let Some(price) = self.price {
            validate::amount(EntityKind::Product, "price", price)?;
        }
        if let Some(Some(original)) = self.original_price {
            validate::amount(EntityKind::Product, "originalPrice", original)?;
        }
        Ok(())
    }
}
