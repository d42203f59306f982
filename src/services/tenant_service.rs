use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::bootstrap::{initialize_database, BootstrapError};
use super::{DomainRegistry, Route};
use crate::database::driver::{filter_of, Document, DocumentDriver, DriverError};
use crate::database::{ConnectionRegistry, DatabaseError, DatabaseHandle};
use crate::model::{get_model, ModelError, ModelHandle};
use crate::schema::SchemaError;
use crate::templates::APPS_COLLECTION;

/// Names shadowed by static path segments of the HTTP routes
pub const RESERVED_TENANT_NAMES: [&str; 1] = ["root"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantInfo {
    pub name: String,
    pub region: String,
    pub environment: String,
    pub domains: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),
    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),
    #[error("Tenant not found: {0}")]
    NotFound(String),
    #[error("Tenant is protected: {0}")]
    Protected(String),
    #[error("Incomplete transfer of collections: {}", .0.join(", "))]
    IncompleteTransfer(Vec<String>),
    #[error("Failed to drop database: {0}")]
    DropFailed(String),
    #[error("Model not found: {0}")]
    MissingModel(String),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Creates, renames and drops tenant databases, keeping the admin `apps`
/// records, cached handles and derived domains in step.
pub struct TenantService {
    domains: Arc<DomainRegistry>,
}

impl TenantService {
    pub fn new(domains: Arc<DomainRegistry>) -> Self {
        Self { domains }
    }

    fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.domains.registry()
    }

    /// Bootstrap a new tenant and register it in the admin `apps` collection
    pub async fn create_tenant(&self, route: &Route, name: &str, domains: &[String]) -> Result<TenantInfo, TenantError> {
        self.validate_tenant_name(name)?;
        let admin = self.registry().admin_database().to_string();
        if name == admin {
            return Err(TenantError::Protected(name.to_string()));
        }

        initialize_database(&self.domains, route, name, false)
            .await
            .map_err(|e| match e {
                BootstrapError::AlreadyExists(name) => TenantError::AlreadyExists(name),
                other => TenantError::Bootstrap(other),
            })?;

        let apps = self.apps_model(route).await?;
        let mut record = Document::new();
        record.insert("name".to_string(), Value::String(name.to_string()));
        record.insert("dbName".to_string(), Value::String(name.to_string()));
        let listed = Value::Array(domains.iter().cloned().map(Value::String).collect());
        record.insert("domains".to_string(), Value::String(listed.to_string()));
        apps.insert_one(&record).await?;

        self.domains.recompute(&admin).await?;
        info!("Created tenant {} on {}/{}", name, route.region, route.environment);

        Ok(TenantInfo {
            name: name.to_string(),
            region: route.region.clone(),
            environment: route.environment.clone(),
            domains: domains.to_vec(),
        })
    }

    /// Move every collection of `source` into a new database `target`
    pub async fn rename_tenant(&self, route: &Route, source: &str, target: &str) -> Result<(), TenantError> {
        self.validate_tenant_name(source)?;
        self.validate_tenant_name(target)?;
        let admin = self.registry().admin_database().to_string();
        if source == admin || target == admin {
            return Err(TenantError::Protected(admin));
        }

        let client = self.registry().get_client(&route.region, &route.environment).await?;
        let driver = client.driver();
        let databases = driver.list_databases().await?;
        if !databases.iter().any(|db| db == source) {
            return Err(TenantError::NotFound(source.to_string()));
        }
        if databases.iter().any(|db| db == target) {
            return Err(TenantError::AlreadyExists(target.to_string()));
        }

        let collections = driver.list_collections(source).await?;
        for collection in &collections {
            copy_collection(driver.as_ref(), source, target, collection).await?;
        }

        let transferred = driver.list_collections(target).await?;
        let missing: Vec<String> = collections
            .iter()
            .filter(|name| !transferred.contains(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(TenantError::IncompleteTransfer(missing));
        }

        driver.drop_database(source).await?;
        self.registry().evict_database(client.uri(), source).await;

        let apps = self.apps_model(route).await?;
        let mut set = Document::new();
        set.insert("name".to_string(), Value::String(target.to_string()));
        set.insert("dbName".to_string(), Value::String(target.to_string()));
        apps.update_many(&filter_of([("name", source)]), &set).await?;

        self.domains.recompute(&admin).await?;
        info!("Renamed tenant {} -> {} ({} collections)", source, target, collections.len());
        Ok(())
    }

    /// Drop a tenant database and its `apps` record
    pub async fn drop_tenant(&self, route: &Route, name: &str) -> Result<(), TenantError> {
        self.validate_tenant_name(name)?;
        let admin = self.registry().admin_database().to_string();
        if name == admin {
            return Err(TenantError::Protected(name.to_string()));
        }

        let client = self.registry().get_client(&route.region, &route.environment).await?;
        let driver = client.driver();
        if !driver.list_databases().await?.iter().any(|db| db == name) {
            return Err(TenantError::NotFound(name.to_string()));
        }

        driver.drop_database(name).await?;
        if driver.list_databases().await?.iter().any(|db| db == name) {
            return Err(TenantError::DropFailed(name.to_string()));
        }
        self.registry().evict_database(client.uri(), name).await;

        let apps = self.apps_model(route).await?;
        apps.delete_many(&filter_of([("name", name)])).await?;

        self.domains.recompute(&admin).await?;
        info!("Dropped tenant {} on {}/{}", name, route.region, route.environment);
        Ok(())
    }

    /// Validate tenant name follows rules
    pub fn validate_tenant_name(&self, name: &str) -> Result<(), TenantError> {
        if name.len() < 2 {
            return Err(TenantError::InvalidName("Tenant name must be at least 2 characters".to_string()));
        }

        if !ConnectionRegistry::is_valid_db_name(name) {
            return Err(TenantError::InvalidName(
                "Tenant name can only contain letters, numbers, hyphens, and underscores (max 63)".to_string(),
            ));
        }

        if RESERVED_TENANT_NAMES.contains(&name) {
            return Err(TenantError::InvalidName(format!("Tenant name '{}' is reserved", name)));
        }

        Ok(())
    }

    async fn admin_handle(&self, route: &Route) -> Result<Arc<DatabaseHandle>, TenantError> {
        let admin = self.registry().admin_database();
        Ok(self.registry().connect(&route.region, &route.environment, admin).await?)
    }

    async fn apps_model(&self, route: &Route) -> Result<Arc<ModelHandle>, TenantError> {
        let admin = self.admin_handle(route).await?;
        get_model(&admin, APPS_COLLECTION)
            .await?
            .ok_or_else(|| TenantError::MissingModel(APPS_COLLECTION.to_string()))
    }
}

async fn copy_collection(driver: &dyn DocumentDriver, source: &str, target: &str, collection: &str) -> Result<(), DriverError> {
    driver.create_collection(target, collection).await?;
    for doc in driver.find(source, collection, &Document::new()).await? {
        driver.insert_one(target, collection, doc).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::driver::Connector;
    use crate::testing::{TestContext, TEST_URI};

    async fn service() -> (TestContext, TenantService) {
        let ctx = TestContext::with_tenant("master").await;
        let service = TenantService::new(ctx.domains.clone());
        (ctx, service)
    }

    #[tokio::test]
    async fn create_registers_app_and_domains() {
        let (ctx, service) = service().await;

        let info = service
            .create_tenant(&ctx.route, "acme", &["https://acme.example".to_string()])
            .await
            .unwrap();

        assert_eq!(info.name, "acme");
        assert!(ctx.domains.is_allowed("https://acme.example"));
        assert!(ctx.domains.is_allowed("http://localhost:3000"));

        let apps = service.apps_model(&ctx.route).await.unwrap();
        assert_eq!(apps.count(&filter_of([("name", "acme")])).await.unwrap(), 1);

        assert!(matches!(
            service.create_tenant(&ctx.route, "acme", &[]).await,
            Err(TenantError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn admin_and_bad_names_are_refused() {
        let (ctx, service) = service().await;

        assert!(matches!(service.create_tenant(&ctx.route, "master", &[]).await, Err(TenantError::Protected(_))));
        assert!(matches!(service.drop_tenant(&ctx.route, "master").await, Err(TenantError::Protected(_))));
        assert!(matches!(service.create_tenant(&ctx.route, "a", &[]).await, Err(TenantError::InvalidName(_))));
        assert!(matches!(service.create_tenant(&ctx.route, "root", &[]).await, Err(TenantError::InvalidName(_))));
        assert!(matches!(service.drop_tenant(&ctx.route, "nobody").await, Err(TenantError::NotFound(_))));
    }

    #[tokio::test]
    async fn drop_removes_database_record_and_domains() {
        let (ctx, service) = service().await;
        service
            .create_tenant(&ctx.route, "acme", &["https://acme.example".to_string()])
            .await
            .unwrap();
        ctx.registry.connect("asia", "development", "acme").await.unwrap();

        service.drop_tenant(&ctx.route, "acme").await.unwrap();

        assert!(!ctx.domains.is_allowed("https://acme.example"));
        assert!(matches!(
            ctx.registry.connect("asia", "development", "acme").await,
            Err(DatabaseError::NotFound(_))
        ));
        let apps = service.apps_model(&ctx.route).await.unwrap();
        assert_eq!(apps.count(&filter_of([("name", "acme")])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rename_moves_collections_and_documents() {
        let (ctx, service) = service().await;
        service.create_tenant(&ctx.route, "acme", &[]).await.unwrap();
        let before = {
            let driver = ctx.connector.connect(TEST_URI).await.unwrap();
            driver.list_collections("acme").await.unwrap()
        };

        service.rename_tenant(&ctx.route, "acme", "globex").await.unwrap();

        let driver = ctx.connector.connect(TEST_URI).await.unwrap();
        let databases = driver.list_databases().await.unwrap();
        assert!(!databases.iter().any(|db| db == "acme"));
        assert_eq!(driver.list_collections("globex").await.unwrap(), before);

        let globex = ctx.registry.connect("asia", "development", "globex").await.unwrap();
        assert!(get_model(&globex, "users").await.unwrap().is_some());

        let apps = service.apps_model(&ctx.route).await.unwrap();
        assert_eq!(apps.count(&filter_of([("name", "globex")])).await.unwrap(), 1);
        assert!(matches!(
            service.rename_tenant(&ctx.route, "acme", "initech").await,
            Err(TenantError::NotFound(_))
        ));
    }
}
