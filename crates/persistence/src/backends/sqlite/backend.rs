//! SQLite backend implementation.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{SqliteConfig, SqliteLocation};
use crate::core::BackendCapability;
use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;

pub(crate) const CAPABILITIES: &[BackendCapability] = &[
    BackendCapability::Crud,
    BackendCapability::HardDelete,
    BackendCapability::FilterPushdown,
    BackendCapability::TextSearch,
    BackendCapability::Pagination,
    BackendCapability::ForeignKeys,
    BackendCapability::UniqueConstraints,
];

/// Relational backend storing each entity in its own SQLite table.
///
/// The connection pool is created on first use and shared by every call.
/// Deletes are hard deletes.
pub struct SqliteBackend {
    config: SqliteConfig,
    pool: OnceCell<Pool<SqliteConnectionManager>>,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("connected", &self.pool.initialized())
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Creates a backend from configuration without connecting.
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Creates a new in-memory SQLite backend.
    pub fn in_memory() -> Self {
        Self::new(SqliteConfig::in_memory())
    }

    /// Opens or creates a file-based SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::new(SqliteConfig::new(path.as_ref().to_string_lossy()))
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    async fn pool(&self) -> StorageResult<&Pool<SqliteConnectionManager>> {
        self.pool
            .get_or_try_init(|| async { self.build_pool() })
            .await
    }

    fn build_pool(&self) -> StorageResult<Pool<SqliteConnectionManager>> {
        let location = self.config.location()?;
        let busy_timeout = Duration::from_millis(self.config.busy_timeout_ms);

        let (manager, max_size) = match &location {
            // Every connection to `:memory:` is a separate database.
            SqliteLocation::Memory => (SqliteConnectionManager::memory(), 1),
            SqliteLocation::File(path) => (
                SqliteConnectionManager::file(path),
                self.config.max_connections.max(1),
            ),
        };
        let enable_wal = self.config.enable_wal && matches!(location, SqliteLocation::File(_));
        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            if enable_wal {
                conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            }
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_millis(self.config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| {
                StorageError::Backend(BackendError::ConnectionFailed {
                    backend_name: "sqlite".to_string(),
                    message: e.to_string(),
                })
            })?;

        let conn = pool.get()?;
        schema::initialize_schema(&conn)?;

        info!(location = ?location, max_connections = max_size, "SQLite backend initialized");
        Ok(pool)
    }

    /// Get a connection from the pool, creating the pool on first use.
    pub(crate) async fn get_connection(
        &self,
    ) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        let pool = self.pool().await?;
        pool.get().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "sqlite".to_string(),
                message: e.to_string(),
            })
        })
    }
}
