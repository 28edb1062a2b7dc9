//! MongoDB backend.
//!
//! Each entity lives in its own collection. Lists, tags and the shipping
//! address are stored as embedded arrays and documents, timestamps as BSON
//! dates. Documents written by other tools may carry a native ObjectId, a
//! string `_id` or a separate `id` field; all three resolve to the same
//! record.
//!
//! Deleting sets `isDeleted` and `deletedAt` instead of removing the
//! document, and every read skips flagged documents.
//!
//! # Example
//!
//! ```no_run
//! use skinstore_persistence::backends::mongodb::MongoBackend;
//! use skinstore_persistence::config::MongoConfig;
//! use skinstore_persistence::core::DataSource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MongoBackend::new(MongoConfig::new("mongodb://localhost:27017", "skinstore"));
//! backend.health_check().await?;
//! let products = backend.get_all_products().await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod convert;
mod storage;

pub use backend::MongoBackend;
