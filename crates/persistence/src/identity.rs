//! Identifier resolution.
//!
//! Every backend keys its records differently: relational rows by a text `id`,
//! documents by a native `_id` (usually an ObjectId, sometimes a string copy
//! or a separate `id` field), spreadsheet rows by whichever id column the sheet
//! happens to have, often holding a number. This module turns all of those
//! into one opaque string identity and drives the locate, update and re-read
//! sequence shared by every adapter.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::codec;
use crate::error::{ResourceError, StorageResult};
use crate::schema::{self, EntitySchema};
use crate::types::{Record, now_timestamp};

/// Spreadsheet columns that may hold a row identifier, in lookup order.
pub const SHEET_ID_COLUMNS: [&str; 4] = ["id", "_id", "ID", "Id"];

/// Converts a stored identifier into its canonical string form.
///
/// Numeric ids become their integer spelling and extended-JSON ObjectIds
/// (`{"$oid": "..."}`) become their hex string.
pub fn normalize_id(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        other => codec::parse_text(other),
    }
    .map(|id| id.trim().to_string())
    .filter(|id| !id.is_empty())
}

/// Compares a stored identifier with a requested one as strings.
pub fn id_matches(stored: &Value, id: &str) -> bool {
    normalize_id(stored).is_some_and(|stored| stored == id.trim())
}

/// Returns the canonical identifier of a spreadsheet row.
pub fn row_id(row: &Record) -> Option<String> {
    SHEET_ID_COLUMNS
        .iter()
        .find_map(|column| row.get(*column).and_then(normalize_id))
}

/// Returns `true` if any candidate id column of the row matches.
pub fn row_matches(row: &Record, id: &str) -> bool {
    SHEET_ID_COLUMNS
        .iter()
        .any(|column| row.get(*column).is_some_and(|value| id_matches(value, id)))
}

/// Builds the document filter for an identifier: the native ObjectId first
/// when the id parses as one, then string equality on `_id` and `id`.
/// Soft-deleted documents never match.
#[cfg(feature = "mongodb")]
pub fn lookup_filter(id: &str) -> mongodb::bson::Document {
    use mongodb::bson::{doc, oid::ObjectId};

    let mut candidates = Vec::with_capacity(3);
    if let Ok(oid) = ObjectId::parse_str(id) {
        candidates.push(doc! { "_id": oid });
    }
    candidates.push(doc! { "_id": id });
    candidates.push(doc! { "id": id });

    doc! {
        "$or": candidates,
        "isDeleted": { "$ne": true },
    }
}

/// A store that can locate a record by any of its identifier shapes.
#[async_trait]
pub trait ResolvableStore: Send + Sync {
    /// Backend-native handle of a located record.
    type Handle: Send + Sync;

    /// Finds a live record and returns its handle with the canonical record.
    async fn locate(
        &self,
        schema: &'static EntitySchema,
        id: &str,
    ) -> StorageResult<Option<(Self::Handle, Record)>>;

    /// Writes already prepared canonical changes to the located record.
    async fn write_changes(
        &self,
        schema: &'static EntitySchema,
        handle: &Self::Handle,
        changes: Record,
    ) -> StorageResult<()>;

    /// Reads the stored record back.
    async fn reload(
        &self,
        schema: &'static EntitySchema,
        handle: &Self::Handle,
    ) -> StorageResult<Option<Record>>;
}

/// Locates a record, applies a partial update and returns the stored result.
///
/// Identity and creation time cannot be changed. Only keys present in
/// `changes` are written, `updatedAt` is stamped, and the returned record is
/// the one read back from the store.
pub async fn resolve_and_update<S>(
    store: &S,
    schema: &'static EntitySchema,
    id: &str,
    mut changes: Record,
) -> StorageResult<Record>
where
    S: ResolvableStore + ?Sized,
{
    for key in [schema::ID, "_id", schema::CREATED_AT] {
        changes.remove(key);
    }

    let Some((handle, current)) = store.locate(schema, id).await? else {
        return Err(ResourceError::not_found(schema.kind, id).into());
    };

    let mut changes = codec::prepare_changes(schema, &current, changes);
    changes.insert(
        schema::UPDATED_AT.to_string(),
        Value::from(now_timestamp()),
    );
    debug!(entity = %schema.kind, id = %id, fields = changes.len(), "Applying update");

    store.write_changes(schema, &handle, changes).await?;
    store
        .reload(schema, &handle)
        .await?
        .ok_or_else(|| ResourceError::not_found(schema.kind, id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{StorageShape, decode_record};
    use crate::schema::PRODUCT;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_normalize_id_shapes() {
        assert_eq!(normalize_id(&json!("abc")), Some("abc".to_string()));
        assert_eq!(normalize_id(&json!(7)), Some("7".to_string()));
        assert_eq!(normalize_id(&json!(7.0)), Some("7".to_string()));
        assert_eq!(
            normalize_id(&json!({"$oid": "65a1f0c2e4b0a1b2c3d4e5f6"})),
            Some("65a1f0c2e4b0a1b2c3d4e5f6".to_string())
        );
        assert_eq!(normalize_id(&json!("")), None);
        assert_eq!(normalize_id(&json!(null)), None);
    }

    #[test]
    fn test_row_matches_any_id_column() {
        let row = match json!({"ID": 12, "name": "Toner"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(row_matches(&row, "12"));
        assert!(!row_matches(&row, "13"));
        assert_eq!(row_id(&row), Some("12".to_string()));
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_lookup_filter_prefers_object_id() {
        let filter = lookup_filter("65a1f0c2e4b0a1b2c3d4e5f6");
        let candidates = filter.get_array("$or").unwrap();
        assert_eq!(candidates.len(), 3);

        let filter = lookup_filter("legacy-42");
        let candidates = filter.get_array("$or").unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(filter.contains_key("isDeleted"));
    }

    struct MemoryStore {
        rows: Mutex<Vec<Record>>,
    }

    #[async_trait]
    impl ResolvableStore for MemoryStore {
        type Handle = usize;

        async fn locate(
            &self,
            schema: &'static EntitySchema,
            id: &str,
        ) -> StorageResult<Option<(usize, Record)>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .position(|row| row_matches(row, id))
                .map(|index| (index, decode_record(schema, &rows[index], StorageShape::Embedded))))
        }

        async fn write_changes(
            &self,
            _schema: &'static EntitySchema,
            handle: &usize,
            changes: Record,
        ) -> StorageResult<()> {
            let mut rows = self.rows.lock().unwrap();
            rows[*handle].extend(changes);
            Ok(())
        }

        async fn reload(
            &self,
            schema: &'static EntitySchema,
            handle: &usize,
        ) -> StorageResult<Option<Record>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .get(*handle)
                .map(|row| decode_record(schema, row, StorageShape::Embedded)))
        }
    }

    fn store() -> MemoryStore {
        let row = match json!({"_id": 3, "name": "Cleanser", "price": 100.0, "createdAt": 10}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        MemoryStore {
            rows: Mutex::new(vec![row]),
        }
    }

    #[tokio::test]
    async fn test_resolve_and_update_preserves_other_fields() {
        let store = store();
        let changes = match json!({"price": 90.0, "id": "hijack", "createdAt": 99}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let updated = resolve_and_update(&store, &PRODUCT, "3", changes)
            .await
            .unwrap();
        assert_eq!(updated["price"], json!(90.0));
        assert_eq!(updated["name"], json!("Cleanser"));
        assert_eq!(updated["createdAt"], json!(10));
        assert!(updated["updatedAt"].as_i64().unwrap() > 10);
    }

    #[tokio::test]
    async fn test_resolve_and_update_not_found() {
        let store = store();
        let err = resolve_and_update(&store, &PRODUCT, "missing", Record::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "product not found: missing");
    }
}
