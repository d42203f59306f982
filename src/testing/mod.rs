use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::database::driver::{Connector, Document, DocumentDriver};
use crate::database::{ConnectionRegistry, DatabaseHandle, MemoryConnector};
use crate::services::{initialize_database, DomainRegistry, Route};
use crate::templates::INIT_COLLECTION;

pub const TEST_URI: &str = "memory://asia";

/// In-memory registry plus one connected database, for unit tests
pub struct TestContext {
    pub connector: MemoryConnector,
    pub registry: Arc<ConnectionRegistry>,
    pub domains: Arc<DomainRegistry>,
    pub route: Route,
    pub handle: Arc<DatabaseHandle>,
}

impl TestContext {
    pub fn registry() -> (MemoryConnector, Arc<ConnectionRegistry>) {
        let connector = MemoryConnector::new();
        let config = DatabaseConfig::with_uris([("asia", "development", TEST_URI)]);
        let registry = Arc::new(ConnectionRegistry::new(config, Arc::new(connector.clone())));
        (connector, registry)
    }

    /// A bare database holding only the `_init` sentinel
    pub async fn with_database(name: &str) -> Self {
        let (connector, registry) = Self::registry();

        let driver = connector.connect(TEST_URI).await.unwrap();
        driver.insert_one(name, INIT_COLLECTION, Document::new()).await.unwrap();
        driver.close().await.unwrap();

        Self::finish(connector, registry, name).await
    }

    /// A database seeded from the v1 templates
    pub async fn with_tenant(name: &str) -> Self {
        let (connector, registry) = Self::registry();
        let domains = DomainRegistry::new(registry.clone());
        initialize_database(&domains, &Route::new("asia", "development"), name, false)
            .await
            .unwrap();

        Self::finish(connector, registry, name).await
    }

    async fn finish(connector: MemoryConnector, registry: Arc<ConnectionRegistry>, name: &str) -> Self {
        let handle = registry.connect("asia", "development", name).await.unwrap();
        Self {
            connector,
            domains: Arc::new(DomainRegistry::new(registry.clone())),
            registry,
            route: Route::new("asia", "development"),
            handle,
        }
    }
}
