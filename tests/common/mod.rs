#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use docbase_api::app::{routes, AppState};
use docbase_api::config::DatabaseConfig;
use docbase_api::database::driver::{Connector, Document, DocumentDriver, DriverError};
use docbase_api::database::{ConnectionRegistry, MemoryConnector};
use docbase_api::services::{DomainRegistry, Route};
use docbase_api::templates::INIT_COLLECTION;

pub const URI: &str = "memory://asia";
pub const REGION: &str = "asia";
pub const ENV: &str = "development";

/// A fresh registry over its own in-memory cluster
pub struct Harness {
    pub connector: MemoryConnector,
    pub registry: Arc<ConnectionRegistry>,
    pub domains: Arc<DomainRegistry>,
}

impl Harness {
    pub fn new() -> Self {
        let connector = MemoryConnector::new();
        Self::build(connector.clone(), Arc::new(connector))
    }

    /// A harness whose connects suspend once, so concurrent callers interleave
    pub fn yielding() -> (Self, Arc<YieldingConnector>) {
        let connector = MemoryConnector::new();
        let yielding = Arc::new(YieldingConnector::new(connector.clone()));
        (Self::build(connector, yielding.clone()), yielding)
    }

    fn build(connector: MemoryConnector, opener: Arc<dyn Connector>) -> Self {
        let config = DatabaseConfig::with_uris([(REGION, ENV, URI)]);
        let registry = Arc::new(ConnectionRegistry::new(config, opener));
        let domains = Arc::new(DomainRegistry::new(registry.clone()));
        Self {
            connector,
            registry,
            domains,
        }
    }

    pub fn route(&self) -> Route {
        Route::new(REGION, ENV)
    }

    /// A connection that bypasses the registry, for arranging and inspecting storage
    pub async fn raw(&self) -> Result<Arc<dyn DocumentDriver>> {
        Ok(self.connector.connect(URI).await?)
    }

    /// Materialize an empty database holding only the sentinel collection
    pub async fn create_database(&self, name: &str) -> Result<()> {
        let driver = self.raw().await?;
        driver.insert_one(name, INIT_COLLECTION, Document::new()).await?;
        driver.close().await?;
        Ok(())
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.registry.clone())
    }
}

/// Yields to the scheduler before every connect
pub struct YieldingConnector {
    inner: MemoryConnector,
    calls: AtomicUsize,
}

impl YieldingConnector {
    pub fn new(inner: MemoryConnector) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for YieldingConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn DocumentDriver>, DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.inner.connect(uri).await
    }
}

pub struct TestServer {
    pub base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve the router on an ephemeral local port
pub async fn spawn_server(state: AppState) -> Result<TestServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let app = routes(state);
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer { base_url, task })
}
