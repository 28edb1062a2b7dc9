//! Spreadsheet backend implementation.

use std::fmt::Debug;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::{self, StorageShape};
use crate::config::SheetsConfig;
use crate::core::BackendCapability;
use crate::error::StorageResult;
use crate::identity;
use crate::schema::{self, EntitySchema};
use crate::types::Record;

use super::client::{HttpSheetsClient, SheetsApi};

pub(crate) const SHAPE: StorageShape = StorageShape::Cells;

pub(crate) const CAPABILITIES: &[BackendCapability] = &[BackendCapability::Crud];

/// Backend storing each entity as a sheet of string cells.
///
/// Holds no state besides the API handle; every call reads the sheet afresh.
#[derive(Debug, Clone)]
pub struct SheetsBackend {
    api: Arc<dyn SheetsApi>,
}

impl SheetsBackend {
    /// Creates a backend talking to the configured web-app endpoint.
    pub fn new(config: SheetsConfig) -> StorageResult<Self> {
        Ok(Self::with_api(Arc::new(HttpSheetsClient::new(config)?)))
    }

    /// Creates a backend over any sheet API implementation.
    pub fn with_api(api: Arc<dyn SheetsApi>) -> Self {
        Self { api }
    }

    pub(crate) fn api(&self) -> &dyn SheetsApi {
        self.api.as_ref()
    }

    /// Reads all rows of an entity's sheet as `(raw row, canonical record)`
    /// pairs, skipping soft-deleted rows.
    pub(crate) async fn live_rows(
        &self,
        schema: &EntitySchema,
    ) -> StorageResult<Vec<(Record, Record)>> {
        let rows = self.api.fetch_rows(schema.sheet).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let record = decode_row(schema, &row);
                (row, record)
            })
            .filter(|(_, record)| !is_deleted(record))
            .collect())
    }
}

/// Decodes a sheet row, taking its id from whichever id column is filled.
pub(crate) fn decode_row(schema: &EntitySchema, row: &Record) -> Record {
    let mut raw = row.clone();
    if let Some(id) = identity::row_id(row) {
        raw.insert(schema::ID.to_string(), Value::String(id));
    }
    codec::decode_record(schema, &raw, SHAPE)
}

fn is_deleted(record: &Record) -> bool {
    record
        .get(schema::IS_DELETED)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Orders records newest first. Rows appended later win ties, since sheets
/// are append-only.
pub(crate) fn newest_first(mut records: Vec<Record>) -> Vec<Record> {
    let created = |record: &Record| {
        record
            .get(schema::CREATED_AT)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    };
    records.reverse();
    records.sort_by_key(|record| std::cmp::Reverse(created(record)));
    records
}

/// Returns the id column a row is keyed by, with the key as written there.
pub(crate) fn row_key(row: &Record, id: &str) -> Option<(String, String)> {
    identity::SHEET_ID_COLUMNS.iter().find_map(|column| {
        let value = row.get(*column)?;
        identity::id_matches(value, id)
            .then(|| (column.to_string(), identity::normalize_id(value).unwrap_or_default()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PRODUCT;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_decode_row_numeric_id_column() {
        let row = record(json!({"ID": 7, "name": "Serum", "price": "12.5"}));
        let decoded = decode_row(&PRODUCT, &row);
        assert_eq!(decoded["id"], json!("7"));
        assert_eq!(decoded["price"], json!(12.5));
    }

    #[test]
    fn test_newest_first_breaks_ties_by_row_order() {
        let records = vec![
            record(json!({"id": "a", "createdAt": 10})),
            record(json!({"id": "b", "createdAt": 20})),
            record(json!({"id": "c", "createdAt": 10})),
        ];
        let ids: Vec<_> = newest_first(records)
            .into_iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("c"), json!("a")]);
    }

    #[test]
    fn test_row_key_finds_matching_column() {
        let row = record(json!({"Id": 42.0, "name": "Mask"}));
        assert_eq!(
            row_key(&row, "42"),
            Some(("Id".to_string(), "42".to_string()))
        );
        assert_eq!(row_key(&row, "43"), None);
    }
}
