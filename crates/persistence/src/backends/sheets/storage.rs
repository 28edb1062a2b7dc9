//! DataSource implementation for spreadsheets.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::core::{BackendCapability, BackendKind, DataSource, DeleteSemantics};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::identity::{self, ResolvableStore};
use crate::schema::{self, EntitySchema};
use crate::types::{EntityKind, Record};

use super::SheetsBackend;
use super::backend::{CAPABILITIES, SHAPE, decode_row, newest_first, row_key};

/// Where a located row lives: its id column and the key written there.
#[derive(Debug, Clone)]
pub struct RowKey {
    column: String,
    key: String,
}

fn canonical_value(schema: &EntitySchema, field: &str, value: &Value) -> StorageResult<Value> {
    let spec = schema.field(field).ok_or_else(|| {
        StorageError::Backend(BackendError::QueryError {
            message: format!("unknown field {}.{}", schema.kind, field),
        })
    })?;
    let cell = codec::encode_field(spec, value, SHAPE);
    Ok(codec::decode_field(spec, Some(&cell), SHAPE))
}

#[async_trait]
impl ResolvableStore for SheetsBackend {
    type Handle = RowKey;

    async fn locate(
        &self,
        schema: &'static EntitySchema,
        id: &str,
    ) -> StorageResult<Option<(RowKey, Record)>> {
        let rows = self.live_rows(schema).await?;
        Ok(rows.into_iter().find_map(|(row, record)| {
            row_key(&row, id).map(|(column, key)| (RowKey { column, key }, record))
        }))
    }

    async fn write_changes(
        &self,
        schema: &'static EntitySchema,
        handle: &RowKey,
        changes: Record,
    ) -> StorageResult<()> {
        let cells = codec::encode_record(schema, &changes, SHAPE);
        let updated = self
            .api()
            .update_row(schema.sheet, &handle.column, &handle.key, cells)
            .await?;
        if !updated {
            warn!(sheet = %schema.sheet, key = %handle.key, "Row vanished before update");
        }
        Ok(())
    }

    async fn reload(
        &self,
        schema: &'static EntitySchema,
        handle: &RowKey,
    ) -> StorageResult<Option<Record>> {
        let rows = self.api().fetch_rows(schema.sheet).await?;
        Ok(rows
            .iter()
            .find(|row| {
                row.get(&handle.column)
                    .is_some_and(|value| identity::id_matches(value, &handle.key))
            })
            .map(|row| decode_row(schema, row)))
    }
}

#[async_trait]
impl DataSource for SheetsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sheets
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        CAPABILITIES.contains(&capability)
    }

    fn delete_semantics(&self, _entity: EntityKind) -> DeleteSemantics {
        DeleteSemantics::Unsupported
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.api()
            .fetch_rows(EntityKind::Product.schema().sheet)
            .await
            .map(|_| ())
    }

    async fn list_records(&self, entity: EntityKind) -> StorageResult<Vec<Record>> {
        let rows = self.live_rows(entity.schema()).await?;
        let records = newest_first(rows.into_iter().map(|(_, record)| record).collect());
        debug!(entity = %entity, count = records.len(), "Listed rows");
        Ok(records)
    }

    async fn find_records_by(
        &self,
        entity: EntityKind,
        field: &str,
        value: &Value,
    ) -> StorageResult<Vec<Record>> {
        let schema = entity.schema();
        let rows = self.live_rows(schema).await?;
        let matching = if field == schema::ID {
            let id = identity::normalize_id(value).unwrap_or_default();
            rows.into_iter()
                .filter(|(row, _)| identity::row_matches(row, &id))
                .map(|(_, record)| record)
                .collect()
        } else {
            let wanted = canonical_value(schema, field, value)?;
            let ignore_case = schema.field(field).is_some_and(|spec| spec.ignore_case);
            rows.into_iter()
                .map(|(_, record)| record)
                .filter(|record| match (record.get(field), &wanted) {
                    (Some(Value::String(stored)), Value::String(wanted)) if ignore_case => {
                        stored.to_lowercase() == wanted.to_lowercase()
                    }
                    (stored, wanted) => stored == Some(wanted),
                })
                .collect()
        };
        Ok(newest_first(matching))
    }

    async fn fetch_record(&self, entity: EntityKind, id: &str) -> StorageResult<Option<Record>> {
        let found = self.locate(entity.schema(), id.trim()).await?;
        Ok(found.map(|(_, record)| record))
    }

    async fn insert_record(&self, entity: EntityKind, mut record: Record) -> StorageResult<Record> {
        let schema = entity.schema();
        let id = uuid::Uuid::new_v4().to_string();
        record.insert(schema::ID.to_string(), Value::String(id.clone()));

        let cells = codec::encode_record(schema, &record, SHAPE);
        self.api().append_row(schema.sheet, cells.clone()).await?;
        debug!(entity = %entity, id = %id, "Appended row");
        Ok(decode_row(schema, &cells))
    }

    async fn update_record(
        &self,
        entity: EntityKind,
        id: &str,
        changes: Record,
    ) -> StorageResult<Record> {
        identity::resolve_and_update(self, entity.schema(), id.trim(), changes).await
    }

    async fn delete_record(&self, entity: EntityKind, id: &str) -> StorageResult<bool> {
        warn!(
            entity = %entity,
            id = %id,
            "Delete is not supported by the spreadsheet backend"
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_value_matches_decoded_cells() {
        let schema = EntityKind::Article.schema();
        assert_eq!(
            canonical_value(schema, "isFeatured", &json!(true)).unwrap(),
            json!(true)
        );
        assert_eq!(
            canonical_value(schema, "slug", &json!("intro")).unwrap(),
            json!("intro")
        );
        assert!(canonical_value(schema, "missing", &json!(1)).is_err());
    }
}
