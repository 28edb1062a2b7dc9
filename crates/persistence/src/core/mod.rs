//! Core data access traits and abstractions.
//!
//! - [`DataSource`] - the contract every backend implements, with typed
//!   per-entity operations provided on top of a small record-level core
//! - [`BackendKind`], [`BackendCapability`] and [`DeleteSemantics`] - runtime
//!   discovery of what the selected backend can do
//!
//! # Implementing a Backend
//!
//! ```ignore
//! use async_trait::async_trait;
//! use skinstore_persistence::core::{BackendCapability, BackendKind, DataSource, DeleteSemantics};
//! use skinstore_persistence::types::{EntityKind, Record};
//!
//! #[derive(Debug)]
//! struct MyBackend;
//!
//! #[async_trait]
//! impl DataSource for MyBackend {
//!     fn kind(&self) -> BackendKind {
//!         BackendKind::Sqlite
//!     }
//!
//!     async fn list_records(&self, entity: EntityKind) -> StorageResult<Vec<Record>> {
//!         // Read, decode with `codec::decode_record`, sort newest first...
//!         todo!()
//!     }
//!
//!     // ... implement the other record-level methods
//! }
//! ```

pub mod backend;
pub mod data_source;

pub use backend::{BackendCapability, BackendKind, DeleteSemantics};
pub use data_source::DataSource;
