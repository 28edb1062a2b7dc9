//! Core types for the persistence layer.
//!
//! This module provides the record model shared by every backend:
//!
//! - [`Record`] and [`EntityKind`] - the canonical, backend-independent shape
//! - [`Product`], [`Category`], [`User`], [`Order`], [`Review`], [`Comment`],
//!   [`Article`] - typed views with their `New*` inputs and `*Patch` updates
//! - [`CompositeValue`], [`Address`], [`LineItem`] - composite field values
//! - [`ArticleQuery`] - listing options for articles
//!
//! # Examples
//!
//! ```
//! use skinstore_persistence::types::{CompositeValue, NewProduct};
//!
//! let product = NewProduct {
//!     name: "Hydrating Serum".to_string(),
//!     price: 350_000.0,
//!     needs: CompositeValue::from(vec!["dry", "sensitive"]),
//!     ..Default::default()
//! };
//! assert!(product.validate().is_ok());
//! ```

mod article;
mod category;
mod comment;
mod composite;
mod order;
mod product;
mod record;
mod review;
mod user;
pub(crate) mod validate;

pub use article::{ARTICLE_SEARCH_FIELDS, Article, ArticlePatch, ArticleQuery, NewArticle};
pub use category::{Category, CategoryPatch, NewCategory};
pub use comment::{Comment, CommentPatch, CommentStatus, NewComment};
pub use composite::{Address, CompositeValue, LineItem, ListItem, StructuredItem};
pub use order::{NewOrder, Order, OrderPatch, OrderStatus, generate_order_number};
pub use product::{NewProduct, Product, ProductPatch};
pub use record::{Entity, EntityKind, Record, from_record, now_timestamp, to_record};
pub use review::{NewReview, Review, ReviewPatch};
pub use user::{NewUser, Role, User, UserPatch};
