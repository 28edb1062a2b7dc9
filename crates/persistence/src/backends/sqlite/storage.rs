//! DataSource implementation for SQLite.

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use serde_json::Value;
use tracing::{debug, error};

use crate::codec::{self, StorageShape};
use crate::core::{BackendCapability, BackendKind, DataSource, DeleteSemantics};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::identity::{self, ResolvableStore};
use crate::schema::{self, EntitySchema, FieldSpec};
use crate::types::{ARTICLE_SEARCH_FIELDS, ArticleQuery, EntityKind, Record};

use super::SqliteBackend;
use super::backend::CAPABILITIES;

const SHAPE: StorageShape = StorageShape::JsonText;
const ORDER_BY: &str = "ORDER BY created_at DESC, rowid DESC";

fn query_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::QueryError { message })
}

/// Converts a canonical JSON value into a bindable SQLite value.
fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => real_value(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn real_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Stored columns of an entity with their canonical names, id first.
fn columns(schema: &EntitySchema) -> Vec<(&'static str, &'static str)> {
    let mut columns = vec![(schema::ID, schema::ID)];
    columns.extend(
        schema
            .all_fields()
            .filter(|field| field.has_column())
            .map(|field| (field.name, field.column)),
    );
    columns
}

fn select_sql(schema: &EntitySchema, filter: &str, tail: &str) -> String {
    let names: Vec<_> = columns(schema).iter().map(|(_, column)| *column).collect();
    format!(
        "SELECT {} FROM {} WHERE is_deleted = 0{} {} {}",
        names.join(", "),
        schema.table,
        filter,
        ORDER_BY,
        tail
    )
    .trim_end()
    .to_string()
}

/// Runs a select and decodes every row into a canonical record.
fn query_records(
    conn: &Connection,
    schema: &EntitySchema,
    filter: &str,
    tail: &str,
    params: &[SqlValue],
) -> StorageResult<Vec<Record>> {
    let sql = select_sql(schema, filter, tail);
    let columns = columns(schema);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut raw = Record::new();
        for (index, (name, _)) in columns.iter().enumerate() {
            raw.insert(name.to_string(), from_sql(row.get_ref(index)?));
        }
        Ok(raw)
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(codec::decode_record(schema, &row?, SHAPE));
    }
    Ok(records)
}

fn fetch_by_id(conn: &Connection, schema: &EntitySchema, id: &str) -> StorageResult<Option<Record>> {
    let records = query_records(
        conn,
        schema,
        " AND id = ?1",
        "LIMIT 1",
        &[SqlValue::Text(id.to_string())],
    )?;
    Ok(records.into_iter().next())
}

/// SQLite's `LIKE` only folds ASCII case, so other search terms are matched
/// in memory after the SQL filters.
pub(crate) fn searches_in_memory(query: &ArticleQuery) -> bool {
    query.search_term().is_some_and(|term| !term.is_ascii())
}

/// Builds the `AND ...` clause and parameters for an article query.
pub(crate) fn article_filter(query: &ArticleQuery) -> (String, Vec<SqlValue>) {
    let mut clause = String::new();
    let mut params = Vec::new();

    if !query.include_unpublished {
        clause.push_str(" AND is_published = 1");
    }
    if let Some(category) = &query.category {
        params.push(SqlValue::Text(category.clone()));
        clause.push_str(&format!(" AND category = ?{}", params.len()));
    }
    if let Some(featured) = query.is_featured {
        params.push(SqlValue::Integer(i64::from(featured)));
        clause.push_str(&format!(" AND is_featured = ?{}", params.len()));
    }
    if let Some(slug) = &query.exclude_slug {
        params.push(SqlValue::Text(slug.clone()));
        clause.push_str(&format!(" AND (slug IS NULL OR slug != ?{})", params.len()));
    }
    if let Some(term) = query.search_term().filter(|_| !searches_in_memory(query)) {
        params.push(SqlValue::Text(format!("%{}%", escape_like(term))));
        let index = params.len();
        let matches: Vec<_> = ARTICLE_SEARCH_FIELDS
            .iter()
            .map(|field| format!("{} LIKE ?{} ESCAPE '\\'", field, index))
            .collect();
        clause.push_str(&format!(" AND ({})", matches.join(" OR ")));
    }

    (clause, params)
}

/// Builds the `LIMIT ... OFFSET ...` tail for an article query.
pub(crate) fn article_page(query: &ArticleQuery) -> String {
    match (query.limit, query.skip) {
        (Some(limit), Some(skip)) => format!("LIMIT {} OFFSET {}", limit, skip),
        (Some(limit), None) => format!("LIMIT {}", limit),
        (None, Some(skip)) => format!("LIMIT -1 OFFSET {}", skip),
        (None, None) => String::new(),
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn write_changes_sql(schema: &EntitySchema, changes: &Record) -> (String, Vec<SqlValue>) {
    let encoded = codec::encode_record(schema, changes, SHAPE);
    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for field in schema.all_fields().filter(|field| field.has_column()) {
        if let Some(value) = encoded.get(field.name) {
            params.push(to_sql(value));
            assignments.push(format!("{} = ?{}", field.column, params.len()));
        }
    }
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        schema.table,
        assignments.join(", "),
        params.len() + 1
    );
    (sql, params)
}

fn field_match(field: &FieldSpec) -> String {
    if field.ignore_case {
        format!(" AND {} = ?1 COLLATE NOCASE", field.column)
    } else {
        format!(" AND {} = ?1", field.column)
    }
}

fn field_for<'a>(schema: &'a EntitySchema, name: &str) -> StorageResult<Option<&'a FieldSpec>> {
    if name == schema::ID {
        return Ok(None);
    }
    schema
        .field(name)
        .filter(|field| field.has_column())
        .map(Some)
        .ok_or_else(|| query_error(format!("unknown field {}.{}", schema.kind, name)))
}

#[async_trait]
impl ResolvableStore for SqliteBackend {
    type Handle = String;

    async fn locate(
        &self,
        schema: &'static EntitySchema,
        id: &str,
    ) -> StorageResult<Option<(String, Record)>> {
        let conn = self.get_connection().await?;
        let record = fetch_by_id(&conn, schema, id.trim())?;
        Ok(record.map(|record| (id.trim().to_string(), record)))
    }

    async fn write_changes(
        &self,
        schema: &'static EntitySchema,
        handle: &String,
        changes: Record,
    ) -> StorageResult<()> {
        let (sql, mut params) = write_changes_sql(schema, &changes);
        params.push(SqlValue::Text(handle.clone()));
        let conn = self.get_connection().await?;
        conn.execute(&sql, params_from_iter(params.iter()))?;
        Ok(())
    }

    async fn reload(
        &self,
        schema: &'static EntitySchema,
        handle: &String,
    ) -> StorageResult<Option<Record>> {
        let conn = self.get_connection().await?;
        fetch_by_id(&conn, schema, handle)
    }
}

#[async_trait]
impl DataSource for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        CAPABILITIES.contains(&capability)
    }

    fn delete_semantics(&self, _entity: EntityKind) -> DeleteSemantics {
        DeleteSemantics::Hard
    }

    async fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection().await?;
        conn.query_row("SELECT 1", [], |_| Ok(())).map_err(|e| {
            StorageError::Backend(BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: e.to_string(),
            })
        })
    }

    async fn list_records(&self, entity: EntityKind) -> StorageResult<Vec<Record>> {
        let schema = entity.schema();
        let conn = self.get_connection().await?;
        let records = query_records(&conn, schema, "", "", &[])?;
        debug!(entity = %entity, count = records.len(), "Listed records");
        Ok(records)
    }

    async fn find_records_by(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>> {
        let schema = entity.schema();
        let (filter, param) = match field_for(schema, field)? {
            Some(spec) => (
                field_match(spec),
                to_sql(&codec::encode_field(spec, value, SHAPE)),
            ),
            None => (format!(" AND {} = ?1", schema::ID), to_sql(value)),
        };
        let conn = self.get_connection().await?;
        query_records(&conn, schema, &filter, "", &[param])
    }

    async fn fetch_record(&self, entity: EntityKind, id: &str) -> StorageResult<Option<Record>> {
        let conn = self.get_connection().await?;
        fetch_by_id(&conn, entity.schema(), id.trim())
    }

    async fn insert_record(&self, entity: EntityKind, mut record: Record) -> StorageResult<Record> {
        let schema = entity.schema();
        let id = uuid::Uuid::new_v4().to_string();
        record.insert(schema::ID.to_string(), Value::String(id.clone()));

        let encoded = codec::encode_record(schema, &record, SHAPE);
        let mut names = Vec::new();
        let mut params = Vec::new();
        for (name, column) in columns(schema) {
            if let Some(value) = encoded.get(name) {
                names.push(column);
                params.push(to_sql(value));
            }
        }
        let placeholders: Vec<_> = (1..=params.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.table,
            names.join(", "),
            placeholders.join(", ")
        );

        let conn = self.get_connection().await?;
        conn.execute(&sql, params_from_iter(params.iter()))?;
        debug!(entity = %entity, id = %id, "Inserted row");

        fetch_by_id(&conn, schema, &id)?.ok_or_else(|| {
            StorageError::Backend(BackendError::Internal {
                backend_name: "sqlite".to_string(),
                message: format!("inserted {} {} could not be read back", entity, id),
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
        let conn = self.get_connection().await?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", schema.table);
        match conn.execute(&sql, [id.trim()]) {
            Ok(removed) => Ok(removed > 0),
            Err(e) => {
                error!(entity = %entity, id = %id, error = %e, "Delete failed");
                Ok(false)
            }
        }
    }

    async fn query_article_records(&self, query: &ArticleQuery) -> StorageResult<Vec<Record>> {
        let (filter, params) = article_filter(query);
        let conn = self.get_connection().await?;
        if searches_in_memory(query) {
            let records = query_records(&conn, EntityKind::Article.schema(), &filter, "", &params)?;
            let matching = records
                .into_iter()
                .filter(|record| query.matches_record(record))
                .collect();
            return Ok(query.paginate(matching));
        }
        query_records(
            &conn,
            EntityKind::Article.schema(),
            &filter,
            &article_page(query),
            &params,
        )
    }

    async fn count_article_records(&self, query: &ArticleQuery) -> StorageResult<u64> {
        if searches_in_memory(query) {
            let unpaged = ArticleQuery {
                skip: None,
                limit: None,
                ..query.clone()
            };
            return Ok(self.query_article_records(&unpaged).await?.len() as u64);
        }
        let (filter, params) = article_filter(query);
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE is_deleted = 0{}",
            EntityKind::Article.schema().table,
            filter
        );
        let conn = self.get_connection().await?;
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_filter_default_hides_drafts() {
        let (clause, params) = article_filter(&ArticleQuery::default());
        assert_eq!(clause, " AND is_published = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_article_filter_numbers_parameters() {
        let query = ArticleQuery {
            include_unpublished: true,
            category: Some("tips".to_string()),
            is_featured: Some(true),
            search: Some("50%_off".to_string()),
            ..Default::default()
        };
        let (clause, params) = article_filter(&query);
        assert!(clause.contains("category = ?1"));
        assert!(clause.contains("is_featured = ?2"));
        assert!(clause.contains("title LIKE ?3 ESCAPE"));
        assert!(clause.contains("content LIKE ?3"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], SqlValue::Text("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn test_non_ascii_search_is_left_out_of_sql() {
        let query = ArticleQuery::published().with_search("ĐẸP");
        assert!(searches_in_memory(&query));
        let (clause, params) = article_filter(&query);
        assert_eq!(clause, " AND is_published = 1");
        assert!(params.is_empty());

        assert!(!searches_in_memory(&ArticleQuery::published().with_search("spf")));
    }

    #[test]
    fn test_field_match_collation() {
        let email = schema::USER.field("email").unwrap();
        assert_eq!(field_match(email), " AND email = ?1 COLLATE NOCASE");
        let slug = schema::ARTICLE.field("slug").unwrap();
        assert_eq!(field_match(slug), " AND slug = ?1");
    }

    #[test]
    fn test_article_page() {
        assert_eq!(article_page(&ArticleQuery::default()), "");
        assert_eq!(
            article_page(&ArticleQuery::default().with_page(10, 5)),
            "LIMIT 5 OFFSET 10"
        );
        let skip_only = ArticleQuery {
            skip: Some(3),
            ..Default::default()
        };
        assert_eq!(article_page(&skip_only), "LIMIT -1 OFFSET 3");
    }

    #[test]
    fn test_write_changes_sql_only_touches_given_columns() {
        let changes = match json!({"price": 10.0, "updatedAt": 5}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let (sql, params) = write_changes_sql(&schema::PRODUCT, &changes);
        assert_eq!(
            sql,
            "UPDATE products SET price = ?1, updated_at = ?2 WHERE id = ?3"
        );
        assert_eq!(params, vec![SqlValue::Real(10.0), SqlValue::Integer(5)]);
    }

    #[test]
    fn test_sql_value_conversion() {
        assert_eq!(to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(from_sql(ValueRef::Integer(7)), json!(7));
        assert_eq!(from_sql(ValueRef::Text(b"x")), json!("x"));
    }
}
