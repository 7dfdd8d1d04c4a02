//! Error types for the DB Connector MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Database errors keep the driver's message verbatim so that callers see exactly
//! what the database reported.

use thiserror::Error;

/// Fixed message reported when an operation runs before its pool is open.
pub const NOT_INITIALIZED_MESSAGE: &str = "Database pool not initialized";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database pool not initialized")]
    NotInitialized { connector: String },

    /// Message is the driver's text, unmodified.
    #[error("{message}")]
    Database {
        message: String,
        /// e.g., "25006" for a write inside a read-only transaction
        sql_state: Option<String>,
    },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Timeout: {operation} {}", timeout_detail(*.limit_secs))]
    Timeout {
        operation: String,
        /// Configured limit, when the caller knows it.
        limit_secs: Option<u64>,
    },

    #[error("Connector not found: {name}")]
    ConnectorNotFound { name: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a not-initialized error for the named connector.
    pub fn not_initialized(connector: impl Into<String>) -> Self {
        Self::NotInitialized {
            connector: connector.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, limit_secs: Option<u64>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            limit_secs,
        }
    }

    /// Attach the configured limit to a timeout that was raised without one.
    pub fn with_timeout_limit(self, limit_secs: u64) -> Self {
        match self {
            Self::Timeout {
                operation,
                limit_secs: None,
            } => Self::timeout(operation, Some(limit_secs)),
            other => other,
        }
    }

    pub fn connector_not_found(name: impl Into<String>) -> Self {
        Self::ConnectorNotFound { name: name.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::NotInitialized { .. } => {
                Some("The server has not finished opening its database pool")
            }
            _ => None,
        }
    }

    /// Get the SQLSTATE code reported by the database, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Database { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(db_err.message(), code)
            }
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", None),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

fn timeout_detail(limit_secs: Option<u64>) -> String {
    match limit_secs {
        Some(secs) => format!("exceeded {secs}s"),
        None => "timed out".to_string(),
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::internal(format!("Serialization failed: {}", err))
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for semantic error categorization.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::Database { message, sql_state } => {
                let data = sql_state
                    .as_ref()
                    .map(|code| serde_json::json!({ "sql_state": code }));
                rmcp::ErrorData::invalid_params(message.clone(), data)
            }
            DbError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            DbError::ConnectorNotFound { .. } => {
                rmcp::ErrorData::resource_not_found(err.to_string(), None)
            }
            DbError::NotInitialized { .. } | DbError::Connection { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }
            DbError::Timeout { .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                suggestion_data(Some("Consider raising acquire_timeout or max_connections")),
            ),
            DbError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_message_is_fixed() {
        let err = DbError::not_initialized("local");
        assert_eq!(err.to_string(), NOT_INITIALIZED_MESSAGE);
        let other = DbError::not_initialized("warehouse");
        assert_eq!(other.to_string(), NOT_INITIALIZED_MESSAGE);
    }

    #[test]
    fn test_database_error_display_is_verbatim() {
        let err = DbError::database(
            "cannot execute INSERT in a read-only transaction",
            Some("25006".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "cannot execute INSERT in a read-only transaction"
        );
        assert_eq!(err.sql_state(), Some("25006"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert_eq!(err.suggestion(), Some("Check credentials"));
        assert!(DbError::invalid_input("bad").suggestion().is_none());
    }

    #[test]
    fn test_database_error_maps_to_invalid_params_with_raw_message() {
        let err = DbError::database(
            "syntax error at or near \"SELEC\"",
            Some("42601".to_string()),
        );
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32602);
        assert_eq!(mcp_err.message, "syntax error at or near \"SELEC\"");
        assert_eq!(mcp_err.data.unwrap()["sql_state"], "42601");
    }

    #[test]
    fn test_database_error_without_sql_state_has_no_data() {
        let err = DbError::database("attempt to write a readonly database", None);
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.data.is_none());
    }

    #[test]
    fn test_not_initialized_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::not_initialized("local").into();
        assert_eq!(mcp_err.code.0, -32603);
        assert_eq!(mcp_err.message, NOT_INITIALIZED_MESSAGE);
    }

    #[test]
    fn test_connector_not_found_maps_to_resource_not_found() {
        let mcp_err: rmcp::ErrorData = DbError::connector_not_found("nope").into();
        // resource_not_found uses -32002 in rmcp
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_connection_error_includes_suggestion_in_data() {
        let err = DbError::connection("failed", "try reconnecting");
        let mcp_err: rmcp::ErrorData = err.into();
        let data = mcp_err.data.unwrap();
        assert_eq!(data["suggestion"], "try reconnecting");
    }

    #[test]
    fn test_timeout_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DbError::timeout("connection pool acquire", Some(30)).into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_pool_timeout_message_uses_known_limit_only() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.to_string(), "Timeout: connection pool acquire timed out");

        let err = err.with_timeout_limit(5);
        assert_eq!(
            err.to_string(),
            "Timeout: connection pool acquire exceeded 5s"
        );
        // An explicit limit is not overwritten.
        assert_eq!(
            err.with_timeout_limit(9).to_string(),
            "Timeout: connection pool acquire exceeded 5s"
        );
        assert!(matches!(
            DbError::invalid_input("x").with_timeout_limit(5),
            DbError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_invalid_input_maps_to_invalid_params() {
        let mcp_err: rmcp::ErrorData = DbError::invalid_input("missing sql").into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
