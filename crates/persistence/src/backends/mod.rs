//! Database backend implementations.
//!
//! Each backend implements [`DataSource`](crate::core::DataSource) and is
//! gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | SQLite | `sqlite` | Embedded relational database, one table per entity, hard deletes |
//! | MongoDB | `mongodb` | Document store with embedded composites, soft deletes |
//! | Sheets | `sheets` | Spreadsheet behind a web-app endpoint, no deletes |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use skinstore_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() {
//! // Create an in-memory SQLite backend
//! let backend = SqliteBackend::in_memory();
//!
//! // Or use a file-based database
//! let backend = SqliteBackend::open("./data/skinstore.db");
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mongodb")]
pub mod mongodb;

#[cfg(feature = "sheets")]
pub mod sheets;
