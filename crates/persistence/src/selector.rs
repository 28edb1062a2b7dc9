//! Data source selection.
//!
//! Turns a [`DataSourceConfig`] into exactly one [`DataSource`]. The process
//! keeps a single selected source, created once by [`init_data_source`] and
//! shared through [`data_source`].

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::DataSourceConfig;
use crate::core::{BackendKind, DataSource};
use crate::error::{ConfigError, StorageResult};

static DATA_SOURCE: OnceLock<Arc<dyn DataSource>> = OnceLock::new();

/// Builds the backend named by the configuration.
///
/// No connection is made here; connection settings are checked on first use.
/// A backend whose feature is not compiled in is reported as an unsupported
/// capability.
pub fn build_data_source(config: &DataSourceConfig) -> StorageResult<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match config {
        DataSourceConfig::Sqlite(config) => sqlite(config)?,
        DataSourceConfig::MongoDB(config) => mongodb(config)?,
        DataSourceConfig::Sheets(config) => sheets(config)?,
    };
    info!(backend = %source.kind(), "Data source selected");
    Ok(source)
}

/// Selects the process-wide data source. Later calls return the source chosen
/// by the first one.
pub fn init_data_source(config: &DataSourceConfig) -> StorageResult<Arc<dyn DataSource>> {
    if let Some(existing) = DATA_SOURCE.get() {
        return Ok(existing.clone());
    }
    let source = build_data_source(config)?;
    Ok(DATA_SOURCE.get_or_init(|| source).clone())
}

/// Returns the process-wide data source.
pub fn data_source() -> StorageResult<Arc<dyn DataSource>> {
    DATA_SOURCE.get().cloned().ok_or_else(|| {
        ConfigError::NotConfigured {
            backend_name: "data source".to_string(),
            setting: "backend".to_string(),
        }
        .into()
    })
}

#[cfg(not(all(feature = "sqlite", feature = "mongodb", feature = "sheets")))]
fn not_compiled(kind: BackendKind) -> crate::error::StorageError {
    use crate::error::{BackendError, StorageError};

    StorageError::Backend(BackendError::UnsupportedCapability {
        backend_name: kind.to_string(),
        capability: format!("backend not compiled in; enable the '{kind}' feature"),
    })
}

#[cfg(feature = "sqlite")]
fn sqlite(config: &crate::config::SqliteConfig) -> StorageResult<Arc<dyn DataSource>> {
    use crate::backends::sqlite::SqliteBackend;
    Ok(Arc::new(SqliteBackend::new(config.clone())))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite(_config: &crate::config::SqliteConfig) -> StorageResult<Arc<dyn DataSource>> {
    Err(not_compiled(BackendKind::Sqlite))
}

#[cfg(feature = "mongodb")]
fn mongodb(config: &crate::config::MongoConfig) -> StorageResult<Arc<dyn DataSource>> {
    use crate::backends::mongodb::MongoBackend;
    Ok(Arc::new(MongoBackend::new(config.clone())))
}

#[cfg(not(feature = "mongodb"))]
fn mongodb(_config: &crate::config::MongoConfig) -> StorageResult<Arc<dyn DataSource>> {
    Err(not_compiled(BackendKind::MongoDB))
}

#[cfg(feature = "sheets")]
fn sheets(config: &crate::config::SheetsConfig) -> StorageResult<Arc<dyn DataSource>> {
    use crate::backends::sheets::SheetsBackend;
    Ok(Arc::new(SheetsBackend::new(config.clone())?))
}

#[cfg(not(feature = "sheets"))]
fn sheets(_config: &crate::config::SheetsConfig) -> StorageResult<Arc<dyn DataSource>> {
    Err(not_compiled(BackendKind::Sheets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MongoConfig, SheetsConfig, SqliteConfig};
    use crate::error::{BackendError, StorageError};

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_build_sqlite() {
        let source = build_data_source(&DataSourceConfig::Sqlite(SqliteConfig::in_memory())).unwrap();
        assert_eq!(source.kind(), BackendKind::Sqlite);
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_mongodb_not_compiled() {
        let err = build_data_source(&DataSourceConfig::MongoDB(MongoConfig::default())).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::UnsupportedCapability { .. })
        ));
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_mongodb_builds_without_connecting() {
        let source = build_data_source(&DataSourceConfig::MongoDB(MongoConfig::default())).unwrap();
        assert_eq!(source.kind(), BackendKind::MongoDB);
    }

    #[cfg(feature = "sheets")]
    #[test]
    fn test_sheets_builds_without_endpoint() {
        let source = build_data_source(&DataSourceConfig::Sheets(SheetsConfig::default())).unwrap();
        assert_eq!(source.kind(), BackendKind::Sheets);
    }

    #[cfg(not(feature = "sheets"))]
    #[test]
    fn test_sheets_not_compiled() {
        let err = build_data_source(&DataSourceConfig::Sheets(SheetsConfig::default())).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::UnsupportedCapability { .. })
        ));
    }
}
