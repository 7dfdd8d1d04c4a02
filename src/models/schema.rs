//! Catalog-related data models.
//!
//! Shapes returned by the list-tables and table-schema operations, plus the
//! pretty-printing every operation shares.

use crate::error::DbResult;
use serde::Serialize;

/// One column of a table, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub column_name: String,
    pub data_type: String,
}

impl ColumnSchema {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Table names in the default schema, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

/// Serialize a value as JSON indented with two spaces.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> DbResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_list_pretty_json() {
        let list = TableList {
            tables: vec!["users".to_string(), "orders".to_string()],
        };
        let json = to_pretty_json(&list).unwrap();
        assert_eq!(json, "{\n  \"tables\": [\n    \"users\",\n    \"orders\"\n  ]\n}");
    }

    #[test]
    fn test_empty_table_list() {
        let list = TableList { tables: Vec::new() };
        assert_eq!(to_pretty_json(&list).unwrap(), "{\n  \"tables\": []\n}");
    }

    #[test]
    fn test_column_schema_field_order() {
        let columns = vec![
            ColumnSchema::new("id", "integer"),
            ColumnSchema::new("name", "text"),
        ];
        let value: serde_json::Value =
            serde_json::from_str(&to_pretty_json(&columns).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"column_name": "id", "data_type": "integer"},
                {"column_name": "name", "data_type": "text"}
            ])
        );
    }

    #[test]
    fn test_empty_column_list_is_empty_array() {
        let columns: Vec<ColumnSchema> = Vec::new();
        assert_eq!(to_pretty_json(&columns).unwrap(), "[]");
    }
}
