//! Backend configuration.
//!
//! Connection settings are optional so that a configuration can always be
//! built; a backend whose required setting is missing fails with
//! [`ConfigError::NotConfigured`](crate::error::ConfigError::NotConfigured) on
//! first use, before any connection attempt.

use serde::{Deserialize, Serialize};

use crate::core::BackendKind;
use crate::error::{ConfigError, StorageResult};

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database location: a file path, `sqlite://path` or `:memory:`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
        }
    }
}

/// Where a SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteLocation {
    Memory,
    File(String),
}

impl SqliteConfig {
    /// Creates a configuration for the given database URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Resolves the database location from the URL.
    pub fn location(&self) -> StorageResult<SqliteLocation> {
        let url = self
            .database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| not_configured("sqlite", "database_url"))?;

        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);

        match path {
            ":memory:" | "" => Ok(SqliteLocation::Memory),
            path => Ok(SqliteLocation::File(path.to_string())),
        }
    }
}

/// Configuration for the MongoDB backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    #[serde(default)]
    pub uri: Option<String>,

    /// Database name. When absent, the default database of the URI is used.
    #[serde(default)]
    pub database: Option<String>,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            database: Some(database.into()),
        }
    }

    /// Returns the connection string or a `NotConfigured` error.
    pub fn require_uri(&self) -> StorageResult<&str> {
        self.uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| not_configured("mongodb", "uri"))
    }
}

/// Configuration for the spreadsheet backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// URL of the spreadsheet web-app endpoint.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    15000
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl SheetsConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            ..Default::default()
        }
    }

    /// Returns the endpoint URL or a `NotConfigured` error.
    pub fn require_endpoint(&self) -> StorageResult<&str> {
        self.endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| not_configured("sheets", "endpoint_url"))
    }
}

/// Selects exactly one backend and carries its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DataSourceConfig {
    Sqlite(SqliteConfig),
    #[serde(rename = "mongodb")]
    MongoDB(MongoConfig),
    Sheets(SheetsConfig),
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        DataSourceConfig::Sqlite(SqliteConfig::default())
    }
}

impl DataSourceConfig {
    /// Returns the selected backend.
    pub fn kind(&self) -> BackendKind {
        match self {
            DataSourceConfig::Sqlite(_) => BackendKind::Sqlite,
            DataSourceConfig::MongoDB(_) => BackendKind::MongoDB,
            DataSourceConfig::Sheets(_) => BackendKind::Sheets,
        }
    }
}

fn not_configured(backend: &str, setting: &str) -> crate::error::StorageError {
    ConfigError::NotConfigured {
        backend_name: backend.to_string(),
        setting: setting.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_location() {
        assert_eq!(
            SqliteConfig::in_memory().location().unwrap(),
            SqliteLocation::Memory
        );
        assert_eq!(
            SqliteConfig::new("sqlite://data/store.db").location().unwrap(),
            SqliteLocation::File("data/store.db".to_string())
        );
        assert_eq!(
            SqliteConfig::new("sqlite::memory:").location().unwrap(),
            SqliteLocation::Memory
        );
        let err = SqliteConfig::default().location().unwrap_err();
        assert!(err.is_not_configured());
    }

    #[test]
    fn test_missing_mongo_uri_is_not_configured() {
        let err = MongoConfig::default().require_uri().unwrap_err();
        assert!(err.is_not_configured());
        assert_eq!(
            MongoConfig::new("mongodb://localhost", "shop")
                .require_uri()
                .unwrap(),
            "mongodb://localhost"
        );
    }

    #[test]
    fn test_data_source_config_serde() {
        let config: DataSourceConfig = serde_json::from_str(
            r#"{"backend": "mongodb", "uri": "mongodb://db:27017", "database": "shop"}"#,
        )
        .unwrap();
        assert_eq!(config.kind(), BackendKind::MongoDB);

        let config: DataSourceConfig =
            serde_json::from_str(r#"{"backend": "sqlite", "database_url": ":memory:"}"#).unwrap();
        match config {
            DataSourceConfig::Sqlite(sqlite) => {
                assert_eq!(sqlite.max_connections, 10);
                assert!(sqlite.enable_wal);
            }
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn test_sheets_default_timeout() {
        let config = SheetsConfig::default();
        assert_eq!(config.request_timeout_ms, 15000);
        assert!(config.require_endpoint().unwrap_err().is_not_configured());
    }
}
