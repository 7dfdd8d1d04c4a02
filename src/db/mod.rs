//! Database access layer.
//!
//! - Connection pool creation per backend
//! - Read-only query execution
//! - Catalog introspection
//! - Row decoding into JSON-ready values
//! - The named connector tying these together

pub mod catalog;
pub mod connector;
pub mod executor;
pub mod pool;
pub mod types;

pub use catalog::CatalogInspector;
pub use connector::DatabaseConnector;
pub use executor::QueryExecutor;
pub use pool::DbPool;
