//! A named database connector: one pool plus the three exposed operations.
//!
//! The pool slot starts empty. `initialize_pool` fills it once, `close_pool`
//! empties it again, and every operation in between borrows a clone of the
//! pool handle so that closing never waits on the slot lock.

use crate::db::catalog::CatalogInspector;
use crate::db::executor::QueryExecutor;
use crate::db::pool::{DbPool, create_pool};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, DatabaseType, TableList, to_pretty_json};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug)]
pub struct DatabaseConnector {
    config: ConnectionConfig,
    pool: RwLock<Option<DbPool>>,
}

impl DatabaseConnector {
    /// Create a connector whose pool is not yet open.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn db_type(&self) -> DatabaseType {
        self.config.db_type
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open the pool. Fails if it is already open.
    pub async fn initialize_pool(&self) -> DbResult<()> {
        let mut slot = self.pool.write().await;
        if slot.is_some() {
            return Err(DbError::connection(
                format!(
                    "Connection pool for '{}' is already initialized",
                    self.config.name
                ),
                "Close the existing pool before opening a new one",
            ));
        }
        *slot = Some(create_pool(&self.config).await?);
        Ok(())
    }

    /// Close the pool if it is open. Calling this again is a no-op.
    pub async fn close_pool(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            info!(connector = %self.config.name, "Connection pool closed");
        } else {
            debug!(connector = %self.config.name, "Connection pool already closed");
        }
    }

    pub async fn is_ready(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Connections currently held by the pool, or `None` if it is closed.
    pub async fn pool_size(&self) -> Option<u32> {
        self.pool.read().await.as_ref().map(DbPool::size)
    }

    async fn pool(&self) -> DbResult<DbPool> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| DbError::not_initialized(&self.config.name))
    }

    /// Fill in the configured acquire timeout on pool timeouts.
    fn stamp_timeout(&self, err: DbError) -> DbError {
        err.with_timeout_limit(self.config.pool_options.acquire_timeout().as_secs())
    }

    /// Run `sql` read-only and render the rows as a pretty-printed JSON array.
    pub async fn query(&self, sql: &str) -> DbResult<String> {
        let pool = self.pool().await?;
        let rows = QueryExecutor::execute_read_only(&pool, sql)
            .await
            .map_err(|e| self.stamp_timeout(e))?;
        info!(connector = %self.config.name, rows = rows.len(), "Query executed");
        to_pretty_json(&rows)
    }

    /// Column names and data types of `table_name`, as a pretty-printed JSON array.
    pub async fn get_table_schema(&self, table_name: &str) -> DbResult<String> {
        let pool = self.pool().await?;
        let columns = CatalogInspector::table_columns(&pool, table_name)
            .await
            .map_err(|e| self.stamp_timeout(e))?;
        info!(
            connector = %self.config.name,
            table = %table_name,
            columns = columns.len(),
            "Table schema fetched"
        );
        to_pretty_json(&columns)
    }

    /// Tables in the default schema, as `{"tables": [...]}`.
    pub async fn list_tables(&self) -> DbResult<String> {
        let pool = self.pool().await?;
        let tables = CatalogInspector::list_tables(&pool)
            .await
            .map_err(|e| self.stamp_timeout(e))?;
        info!(connector = %self.config.name, tables = tables.len(), "Tables listed");
        to_pretty_json(&TableList { tables })
    }
}
