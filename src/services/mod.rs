pub mod bootstrap;
pub mod describe_service;
pub mod domains;
pub mod tenant_service;

use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;

pub use bootstrap::{initialize_database, BootstrapError, BootstrapReport};
pub use describe_service::{CollectionInfo, DescribeError, DescribeService};
pub use domains::DomainRegistry;
pub use tenant_service::{TenantError, TenantInfo, TenantService};

/// Which configured server a request addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub region: String,
    pub environment: String,
}

impl Route {
    pub fn new(region: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            environment: environment.into(),
        }
    }

    /// The configured default region and environment
    pub fn default_for(config: &DatabaseConfig) -> Self {
        Self::new(&config.default_region, &config.default_environment)
    }
}
