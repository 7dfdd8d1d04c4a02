//! DB Connector MCP Server Library
//!
//! Exposes read-only SQL queries, table listings and table schemas of
//! PostgreSQL and SQLite databases as MCP tools and resources.

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod mcp;
pub mod models;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use lifecycle::Lifecycle;
pub use mcp::DbService;
