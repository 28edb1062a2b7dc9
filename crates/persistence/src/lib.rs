//! Skinstore Persistence Layer
//!
//! This crate provides the data access layer of the Skinstore storefront:
//! products, categories, users, orders, reviews, comments and articles behind
//! one [`DataSource`](core::DataSource) contract, whatever the backend.
//!
//! # Backend Features
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! skinstore-persistence = { version = "0.1", features = ["mongodb"] }
//! ```
//!
//! Available backend features:
//! - `sqlite` (default) - SQLite with in-memory and file modes
//! - `mongodb` - MongoDB document storage
//! - `sheets` - spreadsheet rows behind a web-app endpoint
//!
//! # Architecture
//!
//! - [`types`] - entities, their create and patch inputs, and article queries
//! - [`schema`] - per-entity field layout shared by every backend
//! - [`codec`] - conversion between canonical records and each storage shape
//! - [`identity`] - identifier normalization and the locate/update/re-read flow
//! - [`core`] - the [`DataSource`](core::DataSource) trait and capability discovery
//! - [`backends`] - backend implementations
//! - [`config`] and [`selector`] - choosing one backend per process
//! - [`credentials`] - password hashing
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use skinstore_persistence::config::{DataSourceConfig, SqliteConfig};
//! use skinstore_persistence::selector::init_data_source;
//! use skinstore_persistence::types::{ArticleQuery, NewProduct};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = init_data_source(&DataSourceConfig::Sqlite(SqliteConfig::new("skinstore.db")))?;
//!
//! let product = source
//!     .create_product(NewProduct {
//!         name: "Hydrating Serum".to_string(),
//!         price: 24.0,
//!         ..Default::default()
//!     })
//!     .await?;
//! assert!(source.get_product_by_id(&product.id).await?.is_some());
//!
//! let articles = source.get_all_articles(&ArticleQuery::published().with_search("spf")).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod codec;
pub mod config;
pub mod core;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod schema;
pub mod selector;
pub mod types;

pub use error::{StorageError, StorageResult};
