//! Connection-related data models.
//!
//! This module defines types for database connector configuration.

use crate::config::{DatabaseConfig, PoolOptions, validate_connector_name};
use serde::Serialize;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::SQLite => "SQLite",
        }
    }

    /// URI scheme used for this backend's MCP resources.
    pub fn uri_scheme(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "postgres",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuration for one database connector.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Logical name; prefixes tool and resource identifiers.
    pub name: String,
    pub db_type: DatabaseType,
    /// Contains sensitive data - never log
    pub connection_string: String,
    pub pool_options: PoolOptions,
}

impl ConnectionConfig {
    /// Create a new connector configuration.
    pub fn new(
        name: impl Into<String>,
        connection_string: impl Into<String>,
        pool_options: PoolOptions,
    ) -> Result<Self, ConnectionConfigError> {
        let name = name.into();
        let connection_string = connection_string.into();

        validate_connector_name(&name).map_err(ConnectionConfigError::InvalidName)?;

        let db_type = DatabaseType::from_connection_string(&connection_string)
            .ok_or_else(|| ConnectionConfigError::UnknownDatabaseType(mask(&connection_string)))?;

        Ok(Self {
            name,
            db_type,
            connection_string,
            pool_options,
        })
    }

    /// Get a display-safe version of the connection string (credentials masked).
    pub fn masked_connection_string(&self) -> String {
        mask(&self.connection_string)
    }
}

impl TryFrom<&DatabaseConfig> for ConnectionConfig {
    type Error = ConnectionConfigError;

    fn try_from(config: &DatabaseConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.name.clone(),
            config.connection_string.clone(),
            config.pool_options.clone(),
        )
    }
}

fn mask(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.rfind('@') {
        let scheme_end = connection_string.find("://").map(|p| p + 3).unwrap_or(0);
        if let Some(colon_pos) = connection_string[scheme_end..at_pos].find(':') {
            let prefix = &connection_string[..scheme_end + colon_pos + 1];
            let suffix = &connection_string[at_pos..];
            return format!("{}****{}", prefix, suffix);
        }
    }
    connection_string.to_string()
}

/// Errors that can occur when creating a connector configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("{0}")]
    InvalidName(String),

    /// Could not determine database type from connection string
    #[error("Unknown database type in connection string: {0}")]
    UnknownDatabaseType(String),
}
