use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use super::{DomainRegistry, Route};
use crate::database::driver::{Document, DocumentDriver, DriverError};
use crate::database::{ConnectionRegistry, DatabaseError};
use crate::schema::{SchemaRecord, SCHEMAS_COLLECTION};
use crate::templates::{v1, INIT_COLLECTION};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to initialize database: Database '{0}' already exists")]
    AlreadyExists(String),

    #[error("Failed to initialize database: Failed to create database '{0}'")]
    Creation(String),

    #[error("Failed to initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to initialize database: {0}")]
    Driver(#[from] DriverError),
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub message: String,
    pub database: String,
    /// False when the database already existed and `bypass` was set
    pub created: bool,
    /// Template collections present after seeding
    pub collections: Vec<String>,
}

/// Create and seed a tenant database.
///
/// An existing database is an error unless `bypass` is set, in which case
/// only the domain registry is refreshed. Steps are not rolled back on
/// failure; re-running with `bypass` is the recovery path.
pub async fn initialize_database(
    domains: &DomainRegistry,
    route: &Route,
    name: &str,
    bypass: bool,
) -> Result<BootstrapReport, BootstrapError> {
    if !ConnectionRegistry::is_valid_db_name(name) {
        return Err(DatabaseError::InvalidName(name.to_string()).into());
    }

    let registry = domains.registry();
    let client = registry.get_client(&route.region, &route.environment).await?;
    let driver = client.driver();

    if database_listed(driver.as_ref(), name).await? {
        if !bypass {
            return Err(BootstrapError::AlreadyExists(name.to_string()));
        }
        domains.recompute(name).await?;
        info!("Database {} already initialized", name);
        return Ok(BootstrapReport {
            message: "Database already initialized".to_string(),
            database: name.to_string(),
            created: false,
            collections: Vec::new(),
        });
    }

    let mut sentinel = Document::new();
    sentinel.insert("createdAt".to_string(), Value::String(Utc::now().to_rfc3339()));
    driver.insert_one(name, INIT_COLLECTION, sentinel).await?;

    if !database_listed(driver.as_ref(), name).await? {
        return Err(BootstrapError::Creation(name.to_string()));
    }

    let collections = setup_collections(driver.as_ref(), name, registry.config().is_admin(name)).await?;
    domains.recompute(name).await?;

    info!("Successfully initialized database {} ({} collections)", name, collections.len());
    Ok(BootstrapReport {
        message: "Successfully initialized database".to_string(),
        database: name.to_string(),
        created: true,
        collections,
    })
}

async fn database_listed(driver: &dyn DocumentDriver, name: &str) -> Result<bool, DriverError> {
    Ok(driver.list_databases().await?.iter().any(|db| db == name))
}

/// Create template collections, then record their schemas and fixture rows
async fn setup_collections(driver: &dyn DocumentDriver, name: &str, is_admin: bool) -> Result<Vec<String>, DriverError> {
    let templates = v1::templates();

    for template in &templates {
        if template.admin_only && !is_admin {
            continue;
        }
        driver.create_collection(name, template.collection()).await?;
    }

    let listed = driver.list_collections(name).await?;
    let created: Vec<_> = templates
        .iter()
        .filter(|template| listed.iter().any(|c| c == template.collection()))
        .collect();

    if !listed.iter().any(|c| c == SCHEMAS_COLLECTION) {
        warn!("No {} collection in {}; skipping schema records", SCHEMAS_COLLECTION, name);
        return Ok(created.iter().map(|t| t.collection().to_string()).collect());
    }

    for template in &created {
        let record = SchemaRecord::new(template.collection(), &template.map, &template.indices)?;
        driver.insert_one(name, SCHEMAS_COLLECTION, record.to_document()).await?;

        for row in &template.data {
            driver.insert_one(name, template.collection(), row.clone()).await?;
        }
    }

    Ok(created.iter().map(|t| t.collection().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::driver::Connector;
    use crate::testing::{TestContext, TEST_URI};

    fn route() -> Route {
        Route::new("asia", "development")
    }

    #[tokio::test]
    async fn seeds_schema_records_for_each_template() {
        let (connector, registry) = TestContext::registry();
        let domains = DomainRegistry::new(registry.clone());

        let report = initialize_database(&domains, &route(), "acme", false).await.unwrap();
        assert!(report.created);

        let driver = connector.connect(TEST_URI).await.unwrap();
        let collections = driver.list_collections("acme").await.unwrap();
        assert!(collections.iter().any(|c| c == INIT_COLLECTION));
        assert!(!collections.iter().any(|c| c == "appOwners"));

        let schemas = driver.find("acme", SCHEMAS_COLLECTION, &Document::new()).await.unwrap();
        assert_eq!(schemas.len(), report.collections.len());
    }

    #[tokio::test]
    async fn admin_database_gets_admin_templates_and_domains() {
        let (_connector, registry) = TestContext::registry();
        let domains = DomainRegistry::new(registry.clone());

        let report = initialize_database(&domains, &route(), "master", false).await.unwrap();

        assert!(report.collections.iter().any(|c| c == "appOwners"));
        assert!(domains.is_allowed("http://localhost:3000"));
    }

    #[tokio::test]
    async fn second_run_needs_bypass() {
        let (_connector, registry) = TestContext::registry();
        let domains = DomainRegistry::new(registry.clone());
        initialize_database(&domains, &route(), "acme", false).await.unwrap();

        let err = initialize_database(&domains, &route(), "acme", false).await.unwrap_err();
        assert!(matches!(err, BootstrapError::AlreadyExists(_)));
        assert_eq!(err.to_string(), "Failed to initialize database: Database 'acme' already exists");

        let report = initialize_database(&domains, &route(), "acme", true).await.unwrap();
        assert!(!report.created);
    }

    #[tokio::test]
    async fn rejects_invalid_names() {
        let (_connector, registry) = TestContext::registry();
        let domains = DomainRegistry::new(registry);

        let err = initialize_database(&domains, &route(), "bad name", false).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Database(DatabaseError::InvalidName(_))));
    }
}
