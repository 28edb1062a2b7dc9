//! SQLite backend implementation.
//!
//! The relational adapter. Each entity lives in its own table with typed
//! columns; tag lists, item lists and line items are stored as JSON text and
//! the order's shipping address is kept only as flat columns. It supports
//! both in-memory databases (great for testing) and file-based databases.
//!
//! # Example
//!
//! ```no_run
//! use skinstore_persistence::backends::sqlite::SqliteBackend;
//! use skinstore_persistence::core::DataSource;
//! use skinstore_persistence::types::NewCategory;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory();
//! let category = backend
//!     .create_category(NewCategory {
//!         name: "Cleansers".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert!(backend.get_category_by_id(&category.id).await?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE reviews (
//!     id TEXT PRIMARY KEY NOT NULL,
//!     product_id TEXT REFERENCES products(id),
//!     reviewer_name TEXT,
//!     rating REAL,
//!     review TEXT,
//!     review_date TEXT,
//!     created_at INTEGER NOT NULL DEFAULT 0,
//!     updated_at INTEGER NOT NULL DEFAULT 0,
//!     is_deleted INTEGER NOT NULL DEFAULT 0,
//!     deleted_at INTEGER
//! );
//! ```
//!
//! Deletes are hard deletes. A delete rejected by the database, for instance
//! because reviews still reference the product, returns `false` and logs the
//! cause.

mod backend;
mod schema;
mod storage;

pub use backend::SqliteBackend;
