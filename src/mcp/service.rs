//! MCP service implementation using rmcp.
//!
//! Tool and resource identifiers depend on the configured connector names,
//! so the handler is written by hand rather than through rmcp's tool macros.
//! Every connector `{name}` contributes:
//!
//! - tool `{name}_query`
//! - resource `{name}_list_tables`
//! - resource template `{name}_get_table_schema`

use crate::db::DatabaseConnector;
use crate::error::DbError;
use crate::lifecycle::ConnectorSet;
use crate::mcp::resources::{
    ResourceTarget, list_tables_uri, parse_resource_uri, table_schema_template,
};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject,
        ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam,
        AnnotateAble, ProtocolVersion, RawResource, RawResourceTemplate, ReadResourceRequestParam,
        ReadResourceResult, Resource, ResourceContents, ResourceTemplate, ServerCapabilities,
        ServerInfo, Tool,
    },
    handler::server::common::schema_for_type,
    service::RequestContext,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const QUERY_TOOL_SUFFIX: &str = "_query";
const LIST_TABLES_SUFFIX: &str = "_list_tables";
const TABLE_SCHEMA_SUFFIX: &str = "_get_table_schema";
const JSON_MIME_TYPE: &str = "application/json";

/// Arguments of a `{name}_query` tool call.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL to run inside a read-only transaction. Writes are rejected by the database.
    pub sql: String,
}

#[derive(Clone)]
pub struct DbService {
    connectors: ConnectorSet,
}

impl DbService {
    pub fn new(connectors: ConnectorSet) -> Self {
        Self { connectors }
    }

    /// One query tool per connector.
    pub fn tool_definitions(&self) -> Vec<Tool> {
        let input_schema = schema_for_type::<QueryInput>();
        self.connectors
            .iter()
            .map(|c| {
                Tool::new(
                    format!("{}{}", c.name(), QUERY_TOOL_SUFFIX),
                    format!(
                        "Run a read-only SQL query against the {} database '{}' and return the rows as JSON.",
                        c.db_type(),
                        c.name()
                    ),
                    input_schema.clone(),
                )
            })
            .collect()
    }

    /// One list-tables resource per connector.
    pub fn resource_definitions(&self) -> Vec<Resource> {
        self.connectors
            .iter()
            .map(|c| {
                let mut raw = RawResource::new(
                    list_tables_uri(c.db_type().uri_scheme(), c.name()),
                    format!("{}{}", c.name(), LIST_TABLES_SUFFIX),
                );
                raw.description = Some(format!("List the tables in the '{}' database", c.name()));
                raw.mime_type = Some(JSON_MIME_TYPE.to_string());
                raw.no_annotation()
            })
            .collect()
    }

    /// One table-schema resource template per connector.
    pub fn resource_template_definitions(&self) -> Vec<ResourceTemplate> {
        self.connectors
            .iter()
            .map(|c| {
                RawResourceTemplate {
                    uri_template: table_schema_template(c.db_type().uri_scheme(), c.name()),
                    name: format!("{}{}", c.name(), TABLE_SCHEMA_SUFFIX),
                    title: None,
                    description: Some(format!(
                        "Column names and data types of a table in the '{}' database",
                        c.name()
                    )),
                    mime_type: Some(JSON_MIME_TYPE.to_string()),
                }
                .no_annotation()
            })
            .collect()
    }

    /// Dispatch a tool call by name and return the text body.
    pub async fn call_tool_by_name(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<String, McpError> {
        let connector = name
            .strip_suffix(QUERY_TOOL_SUFFIX)
            .and_then(|prefix| self.connectors.get(prefix))
            .ok_or_else(|| McpError::invalid_params(format!("Unknown tool: {name}"), None))?;

        let input: QueryInput =
            serde_json::from_value(serde_json::Value::Object(arguments.unwrap_or_default()))
                .map_err(|e| DbError::invalid_input(format!("Invalid arguments for {name}: {e}")))?;

        debug!(tool = %name, "Calling tool");
        Ok(connector.query(&input.sql).await?)
    }

    /// Resolve a resource URI and return the text body.
    pub async fn read_resource_uri(&self, uri: &str) -> Result<String, McpError> {
        let parsed = parse_resource_uri(uri).ok_or_else(|| {
            McpError::resource_not_found(format!("Unknown resource URI: {uri}"), None)
        })?;

        let connector = self.connector_for(parsed.scheme, parsed.connector)?;
        debug!(uri = %uri, connector = %connector.name(), "Reading resource");

        let body = match parsed.target {
            ResourceTarget::ListTables => connector.list_tables().await?,
            ResourceTarget::TableSchema { table_name } => {
                connector.get_table_schema(table_name).await?
            }
        };
        Ok(body)
    }

    fn connector_for(&self, scheme: &str, name: &str) -> Result<&Arc<DatabaseConnector>, McpError> {
        match self.connectors.get(name) {
            Some(c) if c.db_type().uri_scheme() == scheme => Ok(c),
            _ => Err(DbError::connector_not_found(format!("{scheme}://{name}")).into()),
        }
    }
}

impl ServerHandler for DbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_owned(),
                title: Some("DB Connector MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only access to SQL databases.\n\
                \n\
                Every configured database has a name (`local` unless configured otherwise) \
                that prefixes its tool and resource identifiers:\n\
                - `{name}_query` tool: run SQL in a read-only transaction, rows come back as JSON\n\
                - `{name}_list_tables` resource: `{scheme}://{name}/tables`\n\
                - `{name}_get_table_schema` resource template: \
                `{scheme}://{name}/table/{table_name}/schema`\n\
                \n\
                `scheme` is `postgres` for PostgreSQL and `sqlite` for SQLite databases."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_definitions()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let text = self
            .call_tool_by_name(&request.name, request.arguments)
            .await?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(
            self.resource_definitions(),
        ))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(
            self.resource_template_definitions(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = self.read_resource_uri(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolOptions;
    use crate::models::ConnectionConfig;

    fn create_test_service() -> DbService {
        let connectors = [
            ("local", "postgres://localhost/postgres"),
            ("my_cache", "sqlite:cache.db"),
        ]
        .into_iter()
        .map(|(name, url)| {
            let config = ConnectionConfig::new(name, url, PoolOptions::default()).unwrap();
            Arc::new(DatabaseConnector::new(config))
        })
        .collect();
        DbService::new(ConnectorSet::new(connectors))
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "db-connector-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_tool_names_are_prefixed() {
        let service = create_test_service();
        let names: Vec<String> = service
            .tool_definitions()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, vec!["local_query", "my_cache_query"]);
    }

    #[test]
    fn test_query_tool_schema_requires_sql() {
        let service = create_test_service();
        let tool = &service.tool_definitions()[0];
        let schema = serde_json::Value::Object((*tool.input_schema).clone());
        assert_eq!(schema["properties"]["sql"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["sql"]));
        assert!(schema["properties"]["sql"]["description"].is_string());
    }

    #[test]
    fn test_resources_use_backend_scheme() {
        let service = create_test_service();
        let resources = service.resource_definitions();
        let uris: Vec<&str> = resources.iter().map(|r| r.raw.uri.as_str()).collect();
        assert_eq!(uris, vec!["postgres://local/tables", "sqlite://my_cache/tables"]);
        assert_eq!(resources[0].raw.name, "local_list_tables");
        assert_eq!(resources[0].raw.mime_type.as_deref(), Some(JSON_MIME_TYPE));

        let templates = service.resource_template_definitions();
        assert_eq!(
            templates[1].raw.uri_template,
            "sqlite://my_cache/table/{table_name}/schema"
        );
        assert_eq!(templates[1].raw.name, "my_cache_get_table_schema");
        assert_eq!(
            templates[1].raw.description.as_deref(),
            Some("Column names and data types of a table in the 'my_cache' database")
        );
        assert_eq!(templates[1].raw.mime_type.as_deref(), Some(JSON_MIME_TYPE));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let service = create_test_service();
        let err = service.call_tool_by_name("nope_query", None).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        let err = service.call_tool_by_name("local_drop", None).await.unwrap_err();
        assert!(err.message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_missing_sql_argument_is_invalid_params() {
        let service = create_test_service();
        let err = service.call_tool_by_name("local_query", None).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("sql"));
    }

    #[tokio::test]
    async fn test_unopened_connector_reports_not_initialized() {
        let service = create_test_service();
        let mut args = JsonObject::new();
        args.insert("sql".into(), "SELECT 1".into());
        let err = service
            .call_tool_by_name("local_query", Some(args))
            .await
            .unwrap_err();
        assert_eq!(err.message, crate::error::NOT_INITIALIZED_MESSAGE);

        let err = service
            .read_resource_uri("sqlite://my_cache/tables")
            .await
            .unwrap_err();
        assert_eq!(err.message, crate::error::NOT_INITIALIZED_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_not_found() {
        let service = create_test_service();
        for uri in [
            "postgres://elsewhere/tables",
            "sqlite://local/tables",
            "postgres://local/views",
        ] {
            let err = service.read_resource_uri(uri).await.unwrap_err();
            assert_eq!(err.code.0, -32002, "{uri}");
        }
    }
}
