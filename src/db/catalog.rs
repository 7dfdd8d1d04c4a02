//! Catalog introspection: table names and per-table column types.
//!
//! # Architecture
//!
//! SQL lives in the `queries` submodule. Each backend submodule exposes the
//! same two functions; both take an explicitly acquired connection that is
//! returned to the pool when it goes out of scope.

use crate::db::pool::DbPool;
use crate::error::DbResult;
use crate::models::ColumnSchema;
use tracing::debug;

/// Schema listed by the table-listing operation on PostgreSQL.
pub const DEFAULT_SCHEMA: &str = "public";

/// Catalog inspector for the list-tables and table-schema operations.
pub struct CatalogInspector;

impl CatalogInspector {
    /// Names of the tables in the default schema, in catalog order.
    pub async fn list_tables(pool: &DbPool) -> DbResult<Vec<String>> {
        let tables = match pool {
            DbPool::Postgres(p) => postgres::list_tables(p).await?,
            DbPool::SQLite(p) => sqlite::list_tables(p).await?,
        };
        debug!(count = tables.len(), db_type = %pool.db_type(), "Listed tables");
        Ok(tables)
    }

    /// Columns of every table named `table_name`, in ordinal order.
    ///
    /// An unknown table yields an empty list rather than an error.
    pub async fn table_columns(pool: &DbPool, table_name: &str) -> DbResult<Vec<ColumnSchema>> {
        let columns = match pool {
            DbPool::Postgres(p) => postgres::table_columns(p, table_name).await?,
            DbPool::SQLite(p) => sqlite::table_columns(p, table_name).await?,
        };
        debug!(
            table = %table_name,
            count = columns.len(),
            "Fetched table columns"
        );
        Ok(columns)
    }
}

mod queries {
    pub mod postgres {
        // information_schema columns are domain types; cast so they decode as TEXT.
        pub const LIST_TABLES: &str = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1
        "#;

        // A name can exist in several schemas; their columns are grouped per schema.
        pub const TABLE_COLUMNS: &str = r#"
            SELECT column_name::text AS column_name, data_type::text AS data_type
            FROM information_schema.columns
            WHERE table_name = $1
            ORDER BY table_schema, ordinal_position
        "#;
    }

    pub mod sqlite {
        pub const LIST_TABLES: &str = r#"
            SELECT name AS table_name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
        "#;

        pub const TABLE_COLUMNS: &str = r#"
            SELECT name AS column_name, lower(type) AS data_type
            FROM pragma_table_info(?1)
            ORDER BY cid
        "#;
    }
}

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row};

    pub async fn list_tables(pool: &PgPool) -> DbResult<Vec<String>> {
        let mut conn = pool.acquire().await?;
        let rows = sqlx::query(queries::postgres::LIST_TABLES)
            .bind(DEFAULT_SCHEMA)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<String> { Ok(row.try_get("table_name")?) })
            .collect()
    }

    pub async fn table_columns(pool: &PgPool, table_name: &str) -> DbResult<Vec<ColumnSchema>> {
        let mut conn = pool.acquire().await?;
        let rows = sqlx::query(queries::postgres::TABLE_COLUMNS)
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<ColumnSchema> {
                Ok(ColumnSchema::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("data_type")?,
                ))
            })
            .collect()
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool};

    pub async fn list_tables(pool: &SqlitePool) -> DbResult<Vec<String>> {
        let mut conn = pool.acquire().await?;
        let rows = sqlx::query(queries::sqlite::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<String> { Ok(row.try_get("table_name")?) })
            .collect()
    }

    pub async fn table_columns(pool: &SqlitePool, table_name: &str) -> DbResult<Vec<ColumnSchema>> {
        let mut conn = pool.acquire().await?;
        let rows = sqlx::query(queries::sqlite::TABLE_COLUMNS)
            .bind(table_name)
            .fetch_all(&mut *conn)
            .await?;

        rows.iter()
            .map(|row| -> DbResult<ColumnSchema> {
                Ok(ColumnSchema::new(
                    row.try_get::<String, _>("column_name")?,
                    row.try_get::<String, _>("data_type")?,
                ))
            })
            .collect()
    }
}
