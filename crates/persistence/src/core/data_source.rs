//! The data access contract implemented by every backend.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::backend::{BackendCapability, BackendKind, DeleteSemantics};
use crate::codec;
use crate::credentials;
use crate::error::{ResourceError, StorageResult};
use crate::schema::{self, EntitySchema};
use crate::types::{
    Article, ArticlePatch, ArticleQuery, Category, CategoryPatch, Comment, CommentPatch,
    CommentStatus, Entity, EntityKind, NewArticle, NewCategory, NewComment, NewOrder, NewProduct,
    NewReview, NewUser, Order, OrderPatch, Product, ProductPatch, Record, Review, ReviewPatch, User,
    UserPatch, from_record, generate_order_number, now_timestamp, to_record,
};

/// Uniform access to the storefront's entities, whatever the backend.
///
/// Implementors provide the record-level operations, which take and return
/// canonical [`Record`]s (see [`crate::codec`]). The typed per-entity
/// operations are provided on top of them and are the same for every
/// backend: input validation, uniqueness checks, password hashing and
/// order-number assignment happen here before a backend is involved.
///
/// Listings exclude soft-deleted records and are ordered newest first by
/// `createdAt`. `get_*_by_id` returns `None` for unknown ids while `update_*`
/// fails with [`ResourceError::NotFound`]. `delete_*` returns whether a record
/// was removed or flagged; its exact effect is reported by
/// [`delete_semantics`](DataSource::delete_semantics).
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool;

    /// Returns what deleting a record of `entity` does on this backend.
    fn delete_semantics(&self, entity: EntityKind) -> DeleteSemantics;

    /// Checks that the backend is reachable.
    async fn health_check(&self) -> StorageResult<()>;

    /// Lists all live records of an entity, newest first.
    async fn list_records(&self, entity: EntityKind) -> StorageResult<Vec<Record>>;

    /// Lists live records whose `field` equals `value`, newest first.
    async fn find_records_by(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>>;

    /// Reads one live record by any of its identifier shapes.
    async fn fetch_record(&self, entity: EntityKind, id: &str) -> StorageResult<Option<Record>>;

    /// Stores a prepared, timestamped record under a new id and returns it as
    /// stored.
    async fn insert_record(&self, entity: EntityKind, record: Record) -> StorageResult<Record>;

    /// Applies a partial update and returns the stored result.
    async fn update_record(
        &self,
        entity: EntityKind,
        id: &str,
        changes: Record,
    ) -> StorageResult<Record>;

    /// Deletes a record. Returns `false` if nothing was removed.
    async fn delete_record(&self, entity: EntityKind, id: &str) -> StorageResult<bool>;

    /// Lists article records matching a query, newest first.
    async fn query_article_records(&self, query: &ArticleQuery) -> StorageResult<Vec<Record>> {
        let records = self.list_records(EntityKind::Article).await?;
        let matching = records
            .into_iter()
            .filter(|record| query.matches_record(record))
            .collect();
        Ok(query.paginate(matching))
    }

    /// Counts article records matching a query, ignoring paging.
    async fn count_article_records(&self, query: &ArticleQuery) -> StorageResult<u64> {
        let records = self.list_records(EntityKind::Article).await?;
        Ok(records
            .iter()
            .filter(|record| query.matches_record(record))
            .count() as u64)
    }

    // Products

    async fn get_all_products(&self) -> StorageResult<Vec<Product>> {
        all_of(self).await
    }

    async fn get_product_by_id(&self, id: &str) -> StorageResult<Option<Product>> {
        one_of(self, id).await
    }

    async fn create_product(&self, product: NewProduct) -> StorageResult<Product> {
        product.validate()?;
        create_from(self, to_record(&product)?).await
    }

    async fn update_product(&self, id: &str, patch: ProductPatch) -> StorageResult<Product> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_product(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Product, id).await
    }

    // Categories

    async fn get_all_categories(&self) -> StorageResult<Vec<Category>> {
        all_of(self).await
    }

    async fn get_category_by_id(&self, id: &str) -> StorageResult<Option<Category>> {
        one_of(self, id).await
    }

    async fn create_category(&self, category: NewCategory) -> StorageResult<Category> {
        category.validate()?;
        create_from(self, to_record(&category)?).await
    }

    async fn update_category(&self, id: &str, patch: CategoryPatch) -> StorageResult<Category> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_category(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Category, id).await
    }

    // Users

    async fn get_all_users(&self) -> StorageResult<Vec<User>> {
        all_of(self).await
    }

    async fn get_user_by_id(&self, id: &str) -> StorageResult<Option<User>> {
        one_of(self, id).await
    }

    /// Finds a user by email, ignoring case.
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        first_by(self, "email", Value::String(normalize_email(email))).await
    }

    /// Creates a user. A plaintext password is hashed before it is stored and
    /// the email must not be taken.
    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        user.validate()?;
        let mut record = to_record(&user)?;
        record.insert("email".to_string(), Value::String(normalize_email(&user.email)));
        let password = match user.password.as_deref() {
            Some(plain) => Value::String(credentials::hash_password(plain)?),
            None => Value::Null,
        };
        record.insert("password".to_string(), password);
        create_from(self, record).await
    }

    async fn update_user(&self, id: &str, patch: UserPatch) -> StorageResult<User> {
        patch.validate()?;
        let mut changes = to_record(&patch)?;
        if let Some(email) = &patch.email {
            changes.insert("email".to_string(), Value::String(normalize_email(email)));
        }
        if let Some(plain) = &patch.password {
            changes.insert(
                "password".to_string(),
                Value::String(credentials::hash_password(plain)?),
            );
        }
        update_from(self, id, &changes).await
    }

    async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::User, id).await
    }

    // Orders

    async fn get_all_orders(&self) -> StorageResult<Vec<Order>> {
        all_of(self).await
    }

    async fn get_order_by_id(&self, id: &str) -> StorageResult<Option<Order>> {
        one_of(self, id).await
    }

    async fn get_order_by_number(&self, order_number: &str) -> StorageResult<Option<Order>> {
        first_by(self, "orderNumber", Value::String(order_number.trim().to_string())).await
    }

    /// Creates an order. The total is stored as supplied; an order number is
    /// generated when none is given.
    async fn create_order(&self, order: NewOrder) -> StorageResult<Order> {
        order.validate()?;
        let mut record = to_record(&order)?;
        let number = order
            .order_number
            .filter(|number| !number.trim().is_empty())
            .unwrap_or_else(generate_order_number);
        record.insert("orderNumber".to_string(), Value::String(number));
        create_from(self, record).await
    }

    async fn update_order(&self, id: &str, patch: OrderPatch) -> StorageResult<Order> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_order(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Order, id).await
    }

    // Reviews

    async fn get_all_reviews(&self) -> StorageResult<Vec<Review>> {
        all_of(self).await
    }

    async fn get_review_by_id(&self, id: &str) -> StorageResult<Option<Review>> {
        one_of(self, id).await
    }

    async fn get_reviews_by_product(&self, product_id: &str) -> StorageResult<Vec<Review>> {
        all_by(self, "productId", Value::String(product_id.to_string())).await
    }

    async fn create_review(&self, review: NewReview) -> StorageResult<Review> {
        review.validate()?;
        create_from(self, to_record(&review)?).await
    }

    async fn update_review(&self, id: &str, patch: ReviewPatch) -> StorageResult<Review> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_review(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Review, id).await
    }

    // Comments

    async fn get_all_comments(&self) -> StorageResult<Vec<Comment>> {
        all_of(self).await
    }

    async fn get_comment_by_id(&self, id: &str) -> StorageResult<Option<Comment>> {
        one_of(self, id).await
    }

    /// Lists the comments of a product, optionally only those with a given
    /// moderation status.
    async fn get_comments_by_product(
        &self,
        product_id: &str,
        status: Option<CommentStatus>,
    ) -> StorageResult<Vec<Comment>> {
        let comments: Vec<Comment> =
            all_by(self, "productId", Value::String(product_id.to_string())).await?;
        Ok(match status {
            Some(status) => comments.into_iter().filter(|c| c.status == status).collect(),
            None => comments,
        })
    }

    async fn create_comment(&self, comment: NewComment) -> StorageResult<Comment> {
        comment.validate()?;
        create_from(self, to_record(&comment)?).await
    }

    async fn update_comment(&self, id: &str, patch: CommentPatch) -> StorageResult<Comment> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_comment(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Comment, id).await
    }

    // Articles

    /// Lists articles matching a query. The default query lists published
    /// articles only.
    async fn get_all_articles(&self, query: &ArticleQuery) -> StorageResult<Vec<Article>> {
        self.query_article_records(query)
            .await?
            .into_iter()
            .map(from_record)
            .collect()
    }

    async fn count_articles(&self, query: &ArticleQuery) -> StorageResult<u64> {
        self.count_article_records(query).await
    }

    async fn get_article_by_id(&self, id: &str) -> StorageResult<Option<Article>> {
        one_of(self, id).await
    }

    async fn get_article_by_slug(&self, slug: &str) -> StorageResult<Option<Article>> {
        first_by(self, "slug", Value::String(slug.trim().to_string())).await
    }

    async fn create_article(&self, article: NewArticle) -> StorageResult<Article> {
        article.validate()?;
        create_from(self, to_record(&article)?).await
    }

    async fn update_article(&self, id: &str, patch: ArticlePatch) -> StorageResult<Article> {
        patch.validate()?;
        update_from(self, id, &patch).await
    }

    async fn delete_article(&self, id: &str) -> StorageResult<bool> {
        self.delete_record(EntityKind::Article, id).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn all_of<E, D>(source: &D) -> StorageResult<Vec<E>>
where
    E: Entity,
    D: DataSource + ?Sized,
{
    source
        .list_records(E::KIND)
        .await?
        .into_iter()
        .map(from_record)
        .collect()
}

async fn one_of<E, D>(source: &D, id: &str) -> StorageResult<Option<E>>
where
    E: Entity,
    D: DataSource + ?Sized,
{
    source
        .fetch_record(E::KIND, id)
        .await?
        .map(from_record)
        .transpose()
}

async fn all_by<E, D>(source: &D, field: &str, value: Value) -> StorageResult<Vec<E>>
where
    E: Entity,
    D: DataSource + ?Sized,
{
    source
        .find_records_by(E::KIND, field, &value)
        .await?
        .into_iter()
        .map(from_record)
        .collect()
}

async fn first_by<E, D>(source: &D, field: &str, value: Value) -> StorageResult<Option<E>>
where
    E: Entity,
    D: DataSource + ?Sized,
{
    source
        .find_records_by(E::KIND, field, &value)
        .await?
        .into_iter()
        .next()
        .map(from_record)
        .transpose()
}

/// Rejects a record whose unique fields collide with another live record.
async fn ensure_unique<D>(
    source: &D,
    schema: &'static EntitySchema,
    record: &Record,
    own_id: Option<&str>,
) -> StorageResult<()>
where
    D: DataSource + ?Sized,
{
    let candidates: Vec<_> = schema
        .unique_fields()
        .filter_map(|field| {
            record
                .get(field.name)
                .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                .map(|value| (field, value))
        })
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }

    // The caller may name the record by any identifier shape; compare against
    // the id it is stored under.
    let own_id = match own_id {
        Some(id) => Some(
            source
                .fetch_record(schema.kind, id)
                .await?
                .and_then(|own| own.get(schema::ID).and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| id.to_string()),
        ),
        None => None,
    };

    for (field, value) in candidates {
        let existing = source.find_records_by(schema.kind, field.name, value).await?;
        let taken = existing.iter().any(|other| {
            own_id
                .as_deref()
                .is_none_or(|own| other.get(schema::ID).and_then(Value::as_str) != Some(own))
        });
        if taken {
            return Err(ResourceError::AlreadyExists {
                entity: schema.kind,
                field: field.name.to_string(),
                value: value.as_str().unwrap_or_default().to_string(),
            }
            .into());
        }
    }
    Ok(())
}

async fn create_from<E, D>(source: &D, input: Record) -> StorageResult<E>
where
    E: Entity,
    D: DataSource + ?Sized,
{
    let schema = E::KIND.schema();
    let mut record = codec::prepare_new(schema, input);
    ensure_unique(source, schema, &record, None).await?;

    let now = Value::from(now_timestamp());
    record.insert(schema::CREATED_AT.to_string(), now.clone());
    record.insert(schema::UPDATED_AT.to_string(), now);
    record.insert(schema::IS_DELETED.to_string(), Value::Bool(false));
    record.insert(schema::DELETED_AT.to_string(), Value::Null);

    let stored = source.insert_record(E::KIND, record).await?;
    debug!(entity = %E::KIND, id = ?stored.get(schema::ID), "Created record");
    from_record(stored)
}

async fn update_from<E, D, P>(source: &D, id: &str, patch: &P) -> StorageResult<E>
where
    E: Entity,
    D: DataSource + ?Sized,
    P: Serialize + Sync,
{
    let schema = E::KIND.schema();
    let changes = to_record(patch)?;
    ensure_unique(source, schema, &changes, Some(id)).await?;
    let stored = source.update_record(E::KIND, id, changes).await?;
    from_record(stored)
}
