//! Spreadsheet web-app client.
//!
//! The endpoint speaks a small JSON protocol. Reads are
//! `GET {endpoint}?action=getAll&sheet={sheet}`; writes are a `POST` of
//! `{"action", "sheet", ...}`. Every response is wrapped in
//! `{"success": bool, "data": ..., "error": "..."}`.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::config::SheetsConfig;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::Record;

/// Row-level access to a spreadsheet.
///
/// Rows are header-keyed records of raw cell values. The sheet tool has no
/// delete operation.
#[async_trait]
pub trait SheetsApi: Send + Sync + Debug {
    /// Returns every row of a sheet in sheet order.
    async fn fetch_rows(&self, sheet: &str) -> StorageResult<Vec<Record>>;

    /// Appends a row.
    async fn append_row(&self, sheet: &str, row: Record) -> StorageResult<()>;

    /// Overwrites the given cells of the row whose `key_column` equals `key`.
    /// Returns `false` if no row matched.
    async fn update_row(
        &self,
        sheet: &str,
        key_column: &str,
        key: &str,
        changes: Record,
    ) -> StorageResult<bool>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteRequest<'a> {
    action: &'a str,
    sheet: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_column: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    data: &'a Record,
}

/// [`SheetsApi`] over HTTPS.
#[derive(Clone)]
pub struct HttpSheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
}

impl Debug for HttpSheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSheetsClient")
            .field("endpoint_url", &self.config.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl HttpSheetsClient {
    /// Builds the HTTP client. The endpoint is only checked when a request is
    /// made.
    pub fn new(config: SheetsConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| {
                StorageError::Backend(BackendError::Internal {
                    backend_name: "sheets".to_string(),
                    message: format!("failed to build HTTP client: {e}"),
                    source: Some(Box::new(e)),
                })
            })?;
        Ok(Self { client, config })
    }

    async fn unwrap_envelope(response: reqwest::Response) -> StorageResult<Value> {
        let response = response.error_for_status()?;
        let envelope: Envelope = response.json().await?;
        if envelope.success {
            Ok(envelope.data)
        } else {
            Err(StorageError::Backend(BackendError::QueryError {
                message: envelope
                    .error
                    .unwrap_or_else(|| "spreadsheet request failed".to_string()),
            }))
        }
    }

    async fn post(&self, request: &WriteRequest<'_>) -> StorageResult<Value> {
        let endpoint = self.config.require_endpoint()?;
        let response = self.client.post(endpoint).json(request).send().await?;
        Self::unwrap_envelope(response).await
    }
}

#[async_trait]
impl SheetsApi for HttpSheetsClient {
    async fn fetch_rows(&self, sheet: &str) -> StorageResult<Vec<Record>> {
        let endpoint = self.config.require_endpoint()?;
        let response = self
            .client
            .get(endpoint)
            .query(&[("action", "getAll"), ("sheet", sheet)])
            .send()
            .await?;

        let rows = match Self::unwrap_envelope(response).await? {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                warn!(sheet = %sheet, data = %other, "Expected a list of rows");
                Vec::new()
            }
        };
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    async fn append_row(&self, sheet: &str, row: Record) -> StorageResult<()> {
        self.post(&WriteRequest {
            action: "append",
            sheet,
            id_column: None,
            id: None,
            data: &row,
        })
        .await?;
        Ok(())
    }

    async fn update_row(
        &self,
        sheet: &str,
        key_column: &str,
        key: &str,
        changes: Record,
    ) -> StorageResult<bool> {
        let data = self
            .post(&WriteRequest {
                action: "update",
                sheet,
                id_column: Some(key_column),
                id: Some(key),
                data: &changes,
            })
            .await?;
        Ok(!matches!(data, Value::Bool(false)))
    }
}
