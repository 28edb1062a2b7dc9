//! Editorial articles and the listing query used by the blog pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validate;
use super::{Entity, EntityKind, Record};
use crate::error::ValidationError;

/// A blog article.
///
/// A `None` `published_at` marks a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    pub published_at: Option<i64>,
    #[serde(default)]
    pub is_published: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Article {
    const KIND: EntityKind = EntityKind::Article;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating an article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl NewArticle {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::non_empty(EntityKind::Article, "title", &self.title)?;
        validate::non_empty(EntityKind::Article, "slug", &self.slug)
    }
}

/// Partial update for an article.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl ArticlePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validate::non_empty(EntityKind::Article, "title", title)?;
        }
        if let Some(slug) = &self.slug {
            validate::non_empty(EntityKind::Article, "slug", slug)?;
        }
        Ok(())
    }
}

/// Filtering and paging options for article listings.
///
/// The default query returns every published article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleQuery {
    pub include_unpublished: bool,
    pub category: Option<String>,
    pub is_featured: Option<bool>,
    pub exclude_slug: Option<String>,
    /// Case-insensitive substring over title, excerpt and content.
    pub search: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// Fields matched by [`ArticleQuery::search`].
pub const ARTICLE_SEARCH_FIELDS: [&str; 3] = ["title", "excerpt", "content"];

impl ArticleQuery {
    /// Only published articles.
    pub fn published() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }

    /// Returns the trimmed search term, if any.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Tests a decoded article record against the filters. Paging is not
    /// applied here.
    pub fn matches_record(&self, record: &Record) -> bool {
        let flag = |key: &str| record.get(key).and_then(Value::as_bool).unwrap_or(false);
        let text = |key: &str| record.get(key).and_then(Value::as_str).unwrap_or("");

        if flag("isDeleted") {
            return false;
        }
        if !self.include_unpublished && !flag("isPublished") {
            return false;
        }
        if let Some(category) = &self.category {
            if text("category") != category {
                return false;
            }
        }
        if let Some(featured) = self.is_featured {
            if flag("isFeatured") != featured {
                return false;
            }
        }
        if let Some(slug) = &self.exclude_slug {
            if text("slug") == slug {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            return ARTICLE_SEARCH_FIELDS
                .iter()
                .any(|field| text(field).to_lowercase().contains(&needle));
        }
        true
    }

    /// Applies `skip` and `limit` to an already filtered and ordered list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.skip.unwrap_or(0);
        match self.limit {
            Some(limit) => items.into_iter().skip(skip).take(limit).collect(),
            None => items.into_iter().skip(skip).collect(),
        }
    }
}
