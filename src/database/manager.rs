use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::driver::{Connector, DocumentDriver, DriverError};
use super::handle::{DatabaseHandle, PhysicalClient};
use super::verify;
use crate::config::DatabaseConfig;

/// Errors from ConnectionRegistry
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database '{0}' does not exist.")]
    NotFound(String),

    #[error("Invalid database name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Process-wide cache of physical clients (one per URI) and logical
/// database handles (one per URI + database name).
///
/// Built once at startup and shared by reference; tests build their own.
pub struct ConnectionRegistry {
    config: DatabaseConfig,
    connector: Arc<dyn Connector>,
    clients: RwLock<HashMap<String, Arc<PhysicalClient>>>,
    databases: RwLock<HashMap<String, Arc<DatabaseHandle>>>,
}

impl ConnectionRegistry {
    pub fn new(config: DatabaseConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            clients: RwLock::new(HashMap::new()),
            databases: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn admin_database(&self) -> &str {
        &self.config.admin_database
    }

    pub fn resolve_uri(&self, region: &str, environment: &str) -> Result<String, DatabaseError> {
        self.config.resolve_uri(region, environment)
    }

    /// Physical client for a region/environment, opened on first use
    pub async fn get_client(&self, region: &str, environment: &str) -> Result<Arc<PhysicalClient>, DatabaseError> {
        let uri = self.resolve_uri(region, environment)?;

        // Fast path: try read lock
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(&uri) {
                return Ok(client.clone());
            }
        }

        let driver = self
            .connector
            .connect(&uri)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        // Another caller may have stored a client while we were connecting; keep theirs
        let (client, loser) = {
            let mut clients = self.clients.write().await;
            match clients.get(&uri) {
                Some(existing) => (existing.clone(), Some(driver)),
                None => {
                    let client = Arc::new(PhysicalClient::new(&uri, driver));
                    clients.insert(uri.clone(), client.clone());
                    (client, None)
                }
            }
        };

        match loser {
            Some(driver) => {
                debug!("Discarding duplicate client for: {}", uri);
                close_quietly(driver.as_ref()).await;
            }
            None => info!("Created database client for: {}", uri),
        }
        Ok(client)
    }

    /// Handle for an existing logical database. Fails with `NotFound` when the
    /// server does not list it.
    pub async fn connect(&self, region: &str, environment: &str, name: &str) -> Result<Arc<DatabaseHandle>, DatabaseError> {
        if !Self::is_valid_db_name(name) {
            return Err(DatabaseError::InvalidName(name.to_string()));
        }
        let uri = self.resolve_uri(region, environment)?;

        if !verify::database_exists(self.connector.as_ref(), &uri, name).await? {
            return Err(DatabaseError::NotFound(name.to_string()));
        }

        let key = DatabaseHandle::cache_key(&uri, name);
        {
            let databases = self.databases.read().await;
            if let Some(handle) = databases.get(&key) {
                return Ok(handle.clone());
            }
        }

        let driver = self
            .connector
            .connect(&uri)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        if let Err(e) = driver.ping(name).await {
            close_quietly(driver.as_ref()).await;
            return Err(DatabaseError::Connection(format!("Failed to create connection. {}", e)));
        }

        let (handle, loser) = {
            let mut databases = self.databases.write().await;
            match databases.get(&key) {
                Some(existing) => (existing.clone(), Some(driver)),
                None => {
                    let handle = Arc::new(DatabaseHandle::new(&uri, name, driver));
                    databases.insert(key, handle.clone());
                    (handle, None)
                }
            }
        };

        match loser {
            Some(driver) => close_quietly(driver.as_ref()).await,
            None => info!("Connected database {} on {}", name, uri),
        }
        Ok(handle)
    }

    /// Every pooled physical client
    pub async fn clients(&self) -> Vec<Arc<PhysicalClient>> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Drop the cached handle for `name` on `uri` and close its session.
    /// The next `connect` verifies and opens afresh.
    pub async fn evict_database(&self, uri: &str, name: &str) -> bool {
        let removed = self.databases.write().await.remove(&DatabaseHandle::cache_key(uri, name));
        match removed {
            Some(handle) => {
                close_quietly(handle.driver().as_ref()).await;
                info!("Evicted database handle: {} on {}", name, uri);
                true
            }
            None => false,
        }
    }

    /// Pings the default client to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let client = self
            .get_client(&self.config.default_region, &self.config.default_environment)
            .await?;
        client.driver().list_databases().await?;
        Ok(())
    }

    /// Close and remove all clients and handles (e.g., on shutdown)
    pub async fn close_all(&self) {
        let mut databases = self.databases.write().await;
        for (key, handle) in databases.drain() {
            close_quietly(handle.driver().as_ref()).await;
            debug!("Closed database handle: {}", key);
        }
        drop(databases);

        let mut clients = self.clients.write().await;
        for (uri, client) in clients.drain() {
            close_quietly(client.driver().as_ref()).await;
            info!("Closed database client: {}", uri);
        }
    }

    /// Logical database names: non-empty, at most 63 characters of
    /// `[a-zA-Z0-9_-]`
    pub fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

async fn close_quietly(driver: &dyn DocumentDriver) {
    if let Err(e) = driver.close().await {
        warn!("Failed to close connection to {}: {}", driver.uri(), e);
    }
}
