//! Data models for the DB Connector MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod row;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionConfig, ConnectionConfigError, DatabaseType};
pub use row::{CellValue, Row};
pub use schema::{ColumnSchema, TableList, to_pretty_json};
