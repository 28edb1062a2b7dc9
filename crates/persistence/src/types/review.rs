//! Product reviews shown on product pages.

use serde::{Deserialize, Serialize};

use super::validate;
use super::{Entity, EntityKind};
use crate::error::ValidationError;

/// A published product review.
///
/// `review_date` is a free-form display string ("2 weeks ago") and is stored
/// as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub reviewer_name: String,
    pub rating: f64,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub review_date: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Review {
    const KIND: EntityKind = EntityKind::Review;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: String,
    pub reviewer_name: String,
    pub rating: f64,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub review_date: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty(EntityKind::Review, "productId", &self.product_id)?;
        validate::non_empty(EntityKind::Review, "reviewerName", &self.reviewer_name)?;
        validate::in_range(EntityKind::Review, "rating", self.rating, 0.0, 5.0)
    }
}

/// Partial update for a review.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
}

impl ReviewPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.rating {
            Some(rating) => validate::in_range(EntityKind::Review, "rating", rating, 0.0, 5.0),
            None => Ok(()),
        }
    }
}
