//! Resource URIs exposed per connector.
//!
//! ```text
//! {scheme}://{name}/tables
//! {scheme}://{name}/table/{table_name}/schema
//! ```
//!
//! `scheme` is `postgres` or `sqlite` depending on the backend. Segments are
//! matched verbatim, without percent-decoding.

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUri<'a> {
    pub scheme: &'a str,
    pub connector: &'a str,
    pub target: ResourceTarget<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget<'a> {
    ListTables,
    TableSchema { table_name: &'a str },
}

pub fn list_tables_uri(scheme: &str, connector: &str) -> String {
    format!("{scheme}://{connector}/tables")
}

pub fn table_schema_uri(scheme: &str, connector: &str, table_name: &str) -> String {
    format!("{scheme}://{connector}/table/{table_name}/schema")
}

/// RFC 6570 template for the table-schema resource.
pub fn table_schema_template(scheme: &str, connector: &str) -> String {
    table_schema_uri(scheme, connector, "{table_name}")
}

/// Parse a resource URI, returning `None` if it matches neither shape.
pub fn parse_resource_uri(uri: &str) -> Option<ResourceUri<'_>> {
    let (scheme, rest) = uri.split_once("://")?;
    let (connector, path) = rest.split_once('/')?;
    if scheme.is_empty() || connector.is_empty() {
        return None;
    }

    let target = if path == "tables" {
        ResourceTarget::ListTables
    } else {
        let table_name = path.strip_prefix("table/")?.strip_suffix("/schema")?;
        if table_name.is_empty() || table_name.contains('/') {
            return None;
        }
        ResourceTarget::TableSchema { table_name }
    };

    Some(ResourceUri {
        scheme,
        connector,
        target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_uris() {
        assert_eq!(list_tables_uri("postgres", "local"), "postgres://local/tables");
        assert_eq!(
            table_schema_uri("sqlite", "scratch", "users"),
            "sqlite://scratch/table/users/schema"
        );
        assert_eq!(
            table_schema_template("postgres", "local"),
            "postgres://local/table/{table_name}/schema"
        );
    }

    #[test]
    fn test_parse_list_tables() {
        let parsed = parse_resource_uri("postgres://local/tables").unwrap();
        assert_eq!(parsed.scheme, "postgres");
        assert_eq!(parsed.connector, "local");
        assert_eq!(parsed.target, ResourceTarget::ListTables);
    }

    #[test]
    fn test_parse_table_schema() {
        let parsed = parse_resource_uri("sqlite://my_db/table/order_items/schema").unwrap();
        assert_eq!(parsed.connector, "my_db");
        assert_eq!(
            parsed.target,
            ResourceTarget::TableSchema {
                table_name: "order_items"
            }
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for uri in [
            "postgres://local",
            "postgres://local/",
            "postgres://local/table//schema",
            "postgres://local/table/a/b/schema",
            "postgres://local/table/users",
            "postgres:///tables",
            "local/tables",
            "file:///etc/passwd",
        ] {
            assert!(parse_resource_uri(uri).is_none(), "accepted {uri}");
        }
    }

    #[test]
    fn test_round_trip_through_builder() {
        let uri = table_schema_uri("postgres", "warehouse", "events");
        let parsed = parse_resource_uri(&uri).unwrap();
        assert_eq!(parsed.connector, "warehouse");
        assert_eq!(parsed.target, ResourceTarget::TableSchema { table_name: "events" });
    }
}
