//! Command line and environment configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DATA_SOURCE` | sqlite | Backend: `sqlite`, `mongodb` or `sheets` |
//! | `DATABASE_URL` | | SQLite database path or `sqlite://` URL |
//! | `MONGODB_URI` | | MongoDB connection string |
//! | `MONGODB_DATABASE` | | MongoDB database (defaults to the one in the URI) |
//! | `SHEETS_ENDPOINT_URL` | | Spreadsheet web-app endpoint |
//! | `SKINSTORE_LOG_LEVEL` | info | Log level |
//!
//! Variables may also come from a `.env` file in the working directory.

use clap::Args;

use skinstore_persistence::config::{DataSourceConfig, MongoConfig, SheetsConfig, SqliteConfig};
use skinstore_persistence::core::BackendKind;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Data source and logging settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Backend to use (sqlite, mongodb, sheets).
    #[arg(long, env = "DATA_SOURCE", default_value = "sqlite", global = true)]
    pub data_source: String,

    /// SQLite database path or URL.
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// MongoDB connection string.
    #[arg(long, env = "MONGODB_URI", global = true)]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name.
    #[arg(long, env = "MONGODB_DATABASE", global = true)]
    pub mongodb_database: Option<String>,

    /// Spreadsheet web-app endpoint URL.
    #[arg(long, env = "SHEETS_ENDPOINT_URL", global = true)]
    pub sheets_endpoint_url: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SKINSTORE_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_source: "sqlite".to_string(),
            database_url: None,
            mongodb_uri: None,
            mongodb_database: None,
            sheets_endpoint_url: None,
            log_level: "info".to_string(),
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl StoreConfig {
    /// Returns the selected backend.
    pub fn backend(&self) -> Result<BackendKind, String> {
        self.data_source.parse()
    }

    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match self.backend() {
            Ok(BackendKind::Sqlite) if is_blank(&self.database_url) => {
                errors.push("DATABASE_URL is required for the sqlite data source".to_string());
            }
            Ok(BackendKind::MongoDB) if is_blank(&self.mongodb_uri) => {
                errors.push("MONGODB_URI is required for the mongodb data source".to_string());
            }
            Ok(BackendKind::Sheets) if is_blank(&self.sheets_endpoint_url) => {
                errors.push(
                    "SHEETS_ENDPOINT_URL is required for the sheets data source".to_string(),
                );
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!("Invalid log level: {}", self.log_level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the library configuration for the selected backend.
    pub fn to_data_source_config(&self) -> Result<DataSourceConfig, String> {
        Ok(match self.backend()? {
            BackendKind::Sqlite => DataSourceConfig::Sqlite(SqliteConfig {
                database_url: self.database_url.clone(),
                ..Default::default()
            }),
            BackendKind::MongoDB => DataSourceConfig::MongoDB(MongoConfig {
                uri: self.mongodb_uri.clone(),
                database: self.mongodb_database.clone(),
            }),
            BackendKind::Sheets => DataSourceConfig::Sheets(SheetsConfig {
                endpoint_url: self.sheets_endpoint_url.clone(),
                ..Default::default()
            }),
        })
    }
}
