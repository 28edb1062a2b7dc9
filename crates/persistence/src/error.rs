//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates resource state errors, validation
//! errors, configuration errors and backend errors. Backend driver errors are
//! converted into [`BackendError`] at the adapter boundary so that no
//! driver-specific type ever reaches callers of [`DataSource`](crate::core::DataSource).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::EntityKind;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` if this is a `NotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Resource(ResourceError::NotFound { .. }))
    }

    /// Returns `true` if the error was caused by missing configuration.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, StorageError::Config(ConfigError::NotConfigured { .. }))
    }
}

/// Errors related to record state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The targeted record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// A record with the same unique key already exists.
    #[error("{entity} already exists with {field} = {value}")]
    AlreadyExists {
        entity: EntityKind,
        field: String,
        value: String,
    },
}

impl ResourceError {
    /// Builds a `NotFound` error for the given entity and id.
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        ResourceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors related to input validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A field holds a value outside its allowed domain.
    #[error("invalid {entity}.{field}: {message}")]
    InvalidField {
        entity: EntityKind,
        field: String,
        message: String,
    },

    /// A required field is missing or empty.
    #[error("missing required field: {entity}.{field}")]
    MissingRequiredField { entity: EntityKind, field: String },

    /// A composite field could not be decoded.
    ///
    /// Read paths recover from this locally; it is only surfaced by the
    /// low-level codec functions.
    #[error("malformed {field}: {message}")]
    MalformedInput { field: String, message: String },
}

/// Errors related to backend configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting required by the selected backend is missing.
    #[error("{backend_name} is not configured: missing {setting}")]
    NotConfigured {
        backend_name: String,
        setting: String,
    },

    /// A setting is present but unusable.
    #[error("invalid {backend_name} setting {setting}: {message}")]
    Invalid {
        backend_name: String,
        setting: String,
        message: String,
    },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}: {message}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The requested capability is not supported by this backend.
    #[error("capability '{capability}' not supported by {backend_name}")]
    UnsupportedCapability {
        backend_name: String,
        capability: String,
    },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Implement conversions from common error types

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::ConnectionFailed {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for StorageError {
    fn from(err: mongodb::error::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "mongodb".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sheets")]
impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Backend(BackendError::Unavailable {
            backend_name: "sheets".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::Resource(ResourceError::not_found(EntityKind::Product, "p-1"));
        assert_eq!(err.to_string(), "product not found: p-1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_configured_display() {
        let err = StorageError::Config(ConfigError::NotConfigured {
            backend_name: "mongodb".to_string(),
            setting: "uri".to_string(),
        });
        assert_eq!(err.to_string(), "mongodb is not configured: missing uri");
        assert!(err.is_not_configured());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidField {
            entity: EntityKind::Comment,
            field: "rating".to_string(),
            message: "must be between 1 and 5".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid comment.rating: must be between 1 and 5"
        );
    }

    #[test]
    fn test_unsupported_capability_display() {
        let err = BackendError::UnsupportedCapability {
            backend_name: "sheets".to_string(),
            capability: "delete".to_string(),
        };
        assert!(err.to_string().contains("not supported by sheets"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: StorageError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            StorageError::Backend(BackendError::SerializationError { .. })
        ));
    }
}
