//! Moderated product comments left by signed-in users.

use serde::{Deserialize, Serialize};

use super::validate;
use super::{Entity, EntityKind};
use crate::error::ValidationError;

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    /// Storage spellings, default first.
    pub const VALUES: &'static [&'static str] = &["pending", "approved", "rejected"];
}

/// A user comment on a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    #[serde(default)]
    pub content: String,
    pub rating: i64,
    #[serde(default)]
    pub status: CommentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub product_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub content: String,
    pub rating: i64,
    #[serde(default)]
    pub status: CommentStatus,
}

fn check_rating(rating: i64) -> Result<(), ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::InvalidField {
            entity: EntityKind::Comment,
            field: "rating".to_string(),
            message: format!("must be between 1 and 5, got {rating}"),
        });
    }
    Ok(())
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty(EntityKind::Comment, "productId", &self.product_id)?;
        validate::non_empty(EntityKind::Comment, "userId", &self.user_id)?;
        validate::non_empty(EntityKind::Comment, "content", &self.content)?;
        check_rating(self.rating)
    }
}

/// Partial update for a comment, typically a moderation decision.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CommentStatus>,
}

impl CommentPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.rating {
            Some(rating) => check_rating(rating),
            None => Ok(()),
        }
    }
}
