//! MongoDB backend implementation.

use std::fmt::Debug;

use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, Database};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::MongoConfig;
use crate::core::BackendCapability;
use crate::error::{BackendError, ConfigError, StorageError, StorageResult};
use crate::schema::EntitySchema;

pub(crate) const CAPABILITIES: &[BackendCapability] = &[
    BackendCapability::Crud,
    BackendCapability::SoftDelete,
    BackendCapability::FilterPushdown,
    BackendCapability::TextSearch,
    BackendCapability::Pagination,
];

/// Document backend storing each entity in its own collection.
///
/// The client is created on first use. Deletes only flag documents as
/// deleted, for every entity.
pub struct MongoBackend {
    config: MongoConfig,
    database: OnceCell<Database>,
}

impl Debug for MongoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoBackend")
            .field("database", &self.config.database)
            .field("connected", &self.database.initialized())
            .finish_non_exhaustive()
    }
}

impl MongoBackend {
    /// Creates a backend from configuration without connecting.
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            database: OnceCell::new(),
        }
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    async fn database(&self) -> StorageResult<&Database> {
        self.database
            .get_or_try_init(|| async { self.connect().await })
            .await
    }

    async fn connect(&self) -> StorageResult<Database> {
        let uri = self.config.require_uri()?;
        let client = Client::with_uri_str(uri).await.map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "mongodb".to_string(),
                message: e.to_string(),
            })
        })?;

        let database = match self.config.database.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => client.database(name),
            _ => client.default_database().ok_or_else(|| ConfigError::NotConfigured {
                backend_name: "mongodb".to_string(),
                setting: "database".to_string(),
            })?,
        };

        info!(database = %database.name(), "MongoDB backend initialized");
        Ok(database)
    }

    /// Returns the collection of an entity, connecting on first use.
    pub(crate) async fn collection(
        &self,
        schema: &EntitySchema,
    ) -> StorageResult<Collection<Document>> {
        Ok(self.database().await?.collection(schema.collection))
    }

    pub(crate) async fn ping(&self) -> StorageResult<()> {
        let database = self.database().await?;
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| {
                StorageError::Backend(BackendError::Unavailable {
                    backend_name: "mongodb".to_string(),
                    message: e.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PRODUCT;

    #[tokio::test]
    async fn test_missing_uri_is_not_configured() {
        let backend = MongoBackend::new(MongoConfig::default());
        let err = backend.collection(&PRODUCT).await.unwrap_err();
        assert!(err.is_not_configured());
        assert!(!backend.database.initialized());
    }

    #[tokio::test]
    async fn test_missing_database_is_not_configured() {
        let backend = MongoBackend::new(MongoConfig {
            uri: Some("mongodb://localhost:27017".to_string()),
            database: None,
        });
        let err = backend.collection(&PRODUCT).await.unwrap_err();
        assert!(err.is_not_configured());
    }

    #[tokio::test]
    async fn test_named_database_from_config() {
        let backend = MongoBackend::new(MongoConfig::new("mongodb://localhost:27017", "shop"));
        let collection = backend.collection(&PRODUCT).await.unwrap();
        assert_eq!(collection.name(), "products");
    }
}
