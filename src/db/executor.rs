//! Read-only query execution.
//!
//! # Architecture
//!
//! Every query runs inside its own transaction on a single pooled connection:
//! - `postgres`: the transaction is marked `READ ONLY`, so the server rejects
//!   any write with SQLSTATE 25006
//! - `sqlite`: the pool itself is opened read-only, so writes fail with
//!   "attempt to write a readonly database"
//!
//! On PostgreSQL the SQL is sent as an unnamed prepared statement. The
//! extended protocol accepts exactly one command per statement, so input such
//! as `COMMIT; INSERT ...` cannot end the read-only transaction early.
//!
//! The transaction is committed after the rows are read. On any error it is
//! dropped, which rolls it back and returns the connection to the pool.

use crate::db::pool::DbPool;
use crate::db::types::RowToCells;
use crate::error::DbResult;
use crate::models::Row;
use std::time::Instant;
use tracing::debug;

/// Executes caller-supplied SQL with writes rejected by the database.
pub struct QueryExecutor;

impl QueryExecutor {
    /// Run `sql` read-only and decode every returned row.
    pub async fn execute_read_only(pool: &DbPool, sql: &str) -> DbResult<Vec<Row>> {
        let start = Instant::now();
        debug!(sql = %sql, db_type = %pool.db_type(), "Executing read-only query");

        let rows = match pool {
            DbPool::Postgres(p) => postgres::fetch_rows(p, sql).await?,
            DbPool::SQLite(p) => sqlite::fetch_rows(p, sql).await?,
        };

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );
        Ok(rows)
    }
}

mod postgres {
    use super::*;
    use sqlx::{Executor, PgPool};

    pub async fn fetch_rows(pool: &PgPool, sql: &str) -> DbResult<Vec<Row>> {
        let mut tx = pool.begin().await?;
        (&mut *tx).execute("SET TRANSACTION READ ONLY").await?;
        // Caller SQL is one-off, keep it out of the statement cache
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        rows.iter().map(RowToCells::to_row).collect()
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Executor, SqlitePool};

    pub async fn fetch_rows(pool: &SqlitePool, sql: &str) -> DbResult<Vec<Row>> {
        let mut tx = pool.begin().await?;
        let rows = (&mut *tx).fetch_all(sql).await?;
        tx.commit().await?;

        rows.iter().map(RowToCells::to_row).collect()
    }
}
