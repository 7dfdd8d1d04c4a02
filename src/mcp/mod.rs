//! MCP server integration.
//!
//! Registers every connector's operations with the rmcp framework and maps
//! tool calls and resource reads back onto the connectors.

pub mod resources;
pub mod service;

pub use service::{DbService, QueryInput};
