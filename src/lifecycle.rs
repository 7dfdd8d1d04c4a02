//! Process-wide startup and shutdown of database connectors.

use crate::db::DatabaseConnector;
use crate::error::{DbError, DbResult};
use crate::models::ConnectionConfig;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info};

/// The set of connectors handed to the MCP service.
#[derive(Debug, Clone, Default)]
pub struct ConnectorSet {
    connectors: Arc<[Arc<DatabaseConnector>]>,
}

impl ConnectorSet {
    pub fn new(connectors: Vec<Arc<DatabaseConnector>>) -> Self {
        Self {
            connectors: connectors.into(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DatabaseConnector>> {
        self.connectors.iter().find(|c| c.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DatabaseConnector>> {
        self.connectors.iter()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

/// Owns every connector from startup until shutdown.
#[derive(Debug)]
pub struct Lifecycle {
    connectors: ConnectorSet,
}

impl Lifecycle {
    /// Construct one connector per config and open every pool.
    ///
    /// Pools are opened in order. If one fails, the pools opened before it
    /// are closed and the error is returned.
    pub async fn start(configs: Vec<ConnectionConfig>) -> DbResult<Self> {
        for (i, config) in configs.iter().enumerate() {
            if configs[..i].iter().any(|c| c.name == config.name) {
                return Err(DbError::invalid_input(format!(
                    "Connector name '{}' is configured more than once",
                    config.name
                )));
            }
        }

        let mut opened: Vec<Arc<DatabaseConnector>> = Vec::with_capacity(configs.len());
        for config in configs {
            let connector = Arc::new(DatabaseConnector::new(config));
            if let Err(e) = connector.initialize_pool().await {
                error!(
                    connector = %connector.name(),
                    url = %connector.config().masked_connection_string(),
                    error = %e,
                    "Failed to open connection pool"
                );
                close_all(&opened).await;
                return Err(e);
            }
            opened.push(connector);
        }

        info!(connectors = opened.len(), "All connection pools open");
        Ok(Self {
            connectors: ConnectorSet::new(opened),
        })
    }

    /// Close every open pool. Safe to call more than once.
    pub async fn stop(&self) {
        let connectors: Vec<_> = self.connectors.iter().cloned().collect();
        close_all(&connectors).await;
        info!("All connection pools closed");
    }

    pub fn connectors(&self) -> ConnectorSet {
        self.connectors.clone()
    }
}

async fn close_all(connectors: &[Arc<DatabaseConnector>]) {
    join_all(connectors.iter().map(|c| c.close_pool())).await;
}
