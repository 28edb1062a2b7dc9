//! DataSource implementation for MongoDB.

use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::{Bson, DateTime, Document, doc};
use serde_json::Value;
use tracing::{debug, error};

use crate::codec;
use crate::core::{BackendCapability, BackendKind, DataSource, DeleteSemantics};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::identity::{self, ResolvableStore};
use crate::schema::{self, EntitySchema};
use crate::types::{ARTICLE_SEARCH_FIELDS, ArticleQuery, EntityKind, Record};

use super::MongoBackend;
use super::backend::CAPABILITIES;
use super::convert::{self, SHAPE};

fn newest_first() -> Document {
    doc! { "createdAt": -1, "_id": -1 }
}

fn live() -> Document {
    doc! { "isDeleted": { "$ne": true } }
}

async fn find_all(
    collection: &Collection<Document>,
    schema: &EntitySchema,
    filter: Document,
    query: Option<&ArticleQuery>,
) -> StorageResult<Vec<Record>> {
    let mut find = collection.find(filter).sort(newest_first());
    if let Some(skip) = query.and_then(|q| q.skip) {
        find = find.skip(skip as u64);
    }
    if let Some(limit) = query.and_then(|q| q.limit) {
        find = find.limit(limit as i64);
    }

    let mut cursor = find.await?;
    let mut records = Vec::new();
    while cursor.advance().await? {
        let document = cursor.deserialize_current()?;
        records.push(convert::from_document(schema, document));
    }
    Ok(records)
}

async fn find_one(
    collection: &Collection<Document>,
    schema: &EntitySchema,
    filter: Document,
) -> StorageResult<Option<(Bson, Record)>> {
    let Some(document) = collection.find_one(filter).await? else {
        return Ok(None);
    };
    let handle = document.get("_id").cloned().unwrap_or(Bson::Null);
    Ok(Some((handle, convert::from_document(schema, document))))
}

/// Builds the document filter for an article query.
pub(crate) fn article_filter(query: &ArticleQuery) -> Document {
    let mut filter = live();
    if !query.include_unpublished {
        filter.insert("isPublished", true);
    }
    if let Some(category) = &query.category {
        filter.insert("category", category.as_str());
    }
    if let Some(featured) = query.is_featured {
        filter.insert("isFeatured", featured);
    }
    if let Some(slug) = &query.exclude_slug {
        filter.insert("slug", doc! { "$ne": slug.as_str() });
    }
    if let Some(term) = query.search_term() {
        let pattern = regex::escape(term);
        let matches: Vec<Document> = ARTICLE_SEARCH_FIELDS
            .iter()
            .map(|field| {
                let mut matcher = Document::new();
                matcher.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                matcher
            })
            .collect();
        filter.insert("$or", matches);
    }
    filter
}

fn field_filter(schema: &EntitySchema, name: &str, value: &Value) -> StorageResult<Document> {
    if name == schema::ID {
        let id = identity::normalize_id(value).unwrap_or_default();
        return Ok(identity::lookup_filter(&id));
    }
    let field = schema.field(name).ok_or_else(|| {
        StorageError::Backend(BackendError::QueryError {
            message: format!("unknown field {}.{}", schema.kind, name),
        })
    })?;
    let encoded = codec::encode_field(field, value, SHAPE);
    let mut filter = live();
    match encoded.as_str() {
        Some(text) if field.ignore_case => {
            filter.insert(
                name,
                doc! { "$regex": format!("^{}$", regex::escape(text)), "$options": "i" },
            );
        }
        _ => {
            filter.insert(name, convert::field_to_bson(field, &encoded)?);
        }
    }
    Ok(filter)
}

#[async_trait]
impl ResolvableStore for MongoBackend {
    type Handle = Bson;

    async fn locate(
        &self,
        schema: &'static EntitySchema,
        id: &str,
    ) -> StorageResult<Option<(Bson, Record)>> {
        let collection = self.collection(schema).await?;
        find_one(&collection, schema, identity::lookup_filter(id.trim())).await
    }

    async fn write_changes(
        &self,
        schema: &'static EntitySchema,
        handle: &Bson,
        changes: Record,
    ) -> StorageResult<()> {
        let set = convert::to_document(schema, &changes)?;
        let collection = self.collection(schema).await?;
        collection
            .update_one(doc! { "_id": handle.clone() }, doc! { "$set": set })
            .await?;
        Ok(())
    }

    async fn reload(
        &self,
        schema: &'static EntitySchema,
        handle: &Bson,
    ) -> StorageResult<Option<Record>> {
        let collection = self.collection(schema).await?;
        let found = find_one(&collection, schema, doc! { "_id": handle.clone() }).await?;
        Ok(found.map(|(_, record)| record))
    }
}

#[async_trait]
impl DataSource for MongoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDB
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        CAPABILITIES.contains(&capability)
    }

    fn delete_semantics(&self, _entity: EntityKind) -> DeleteSemantics {
        DeleteSemantics::Soft
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.ping().await
    }

    async fn list_records(&self, entity: EntityKind) -> StorageResult<Vec<Record>> {
        let schema = entity.schema();
        let collection = self.collection(schema).await?;
        let records = find_all(&collection, schema, live(), None).await?;
        debug!(entity = %entity, count = records.len(), "Listed documents");
        Ok(records)
    }

    async fn find_records_by(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>> {
        let schema = entity.schema();
        let filter = field_filter(schema, field, value)?;
        let collection = self.collection(schema).await?;
        find_all(&collection, schema, filter, None).await
    }

    async fn fetch_record(&self, entity: EntityKind, id: &str) -> StorageResult<Option<Record>> {
        let found = self.locate(entity.schema(), id).await?;
        Ok(found.map(|(_, record)| record))
    }

    async fn insert_record(&self, entity: EntityKind, record: Record) -> StorageResult<Record> {
        let schema = entity.schema();
        let mut document = convert::to_document(schema, &record)?;
        document.remove(schema::ID);

        let collection = self.collection(schema).await?;
        let inserted = collection.insert_one(document).await?;
        debug!(entity = %entity, id = %inserted.inserted_id, "Inserted document");

        let found = find_one(&collection, schema, doc! { "_id": inserted.inserted_id.clone() })
            .await?;
        found.map(|(_, record)| record).ok_or_else(|| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "mongodb".to_string(),
                message: format!(
                    "inserted {} {} could not be read back",
                    entity, inserted.inserted_id
                ),
                source: None,
            })
        })
    }

    async fn update_record(
        &self,
        entity: EntityKind,
        id: &str,
        changes: Record,
    ) -> StorageResult<Record> {
        identity::resolve_and_update(self, entity.schema(), id, changes).await
    }

    async fn delete_record(&self, entity: EntityKind, id: &str) -> StorageResult<bool> {
        let schema = entity.schema();
        let collection = self.collection(schema).await?;
        let now = DateTime::now();
        let update = doc! {
            "$set": { "isDeleted": true, "deletedAt": now, "updatedAt": now },
        };
        match collection
            .update_one(identity::lookup_filter(id.trim()), update)
            .await
        {
            Ok(result) => Ok(result.matched_count > 0),
            Err(e) => {
                error!(entity = %entity, id = %id, error = %e, "Soft delete failed");
                Ok(false)
            }
        }
    }

    async fn query_article_records(&self, query: &ArticleQuery) -> StorageResult<Vec<Record>> {
        let schema = EntityKind::Article.schema();
        let collection = self.collection(schema).await?;
        find_all(&collection, schema, article_filter(query), Some(query)).await
    }

    async fn count_article_records(&self, query: &ArticleQuery) -> StorageResult<u64> {
        let collection = self.collection(EntityKind::Article.schema()).await?;
        Ok(collection.count_documents(article_filter(query)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_filter_default_hides_drafts() {
        let filter = article_filter(&ArticleQuery::default());
        assert_eq!(filter.get_bool("isPublished").unwrap(), true);
        assert!(filter.get_document("isDeleted").is_ok());
        assert!(filter.get("$or").is_none());
    }

    #[test]
    fn test_article_filter_escapes_search() {
        let query = ArticleQuery {
            include_unpublished: true,
            exclude_slug: Some("intro".to_string()),
            search: Some(" a+b ".to_string()),
            ..Default::default()
        };
        let filter = article_filter(&query);
        assert!(filter.get("isPublished").is_none());
        assert_eq!(filter.get_document("slug").unwrap(), &doc! { "$ne": "intro" });

        let matches = filter.get_array("$or").unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(
            matches[0],
            Bson::Document(doc! { "title": { "$regex": "a\\+b", "$options": "i" } })
        );
    }

    #[test]
    fn test_field_filter_encodes_value() {
        let filter = field_filter(
            EntityKind::Article.schema(),
            "isFeatured",
            &json!("yes"),
        )
        .unwrap();
        assert_eq!(filter.get_bool("isFeatured").unwrap(), true);

        let err = field_filter(EntityKind::Product.schema(), "nope", &json!(1)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::QueryError { .. })
        ));
    }

    #[test]
    fn test_email_filter_ignores_case() {
        let filter = field_filter(EntityKind::User.schema(), "email", &json!("a.b+c@shop.vn")).unwrap();
        assert_eq!(
            filter.get_document("email").unwrap(),
            &doc! { "$regex": "^a\\.b\\+c@shop\\.vn$", "$options": "i" }
        );
        assert!(filter.get_document("isDeleted").is_ok());
    }

    #[test]
    fn test_id_field_uses_lookup_filter() {
        let filter = field_filter(EntityKind::Product.schema(), "id", &json!("abc")).unwrap();
        assert!(filter.get_array("$or").is_ok());
    }
}
