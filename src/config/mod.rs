use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

use crate::database::DatabaseError;

pub const REGIONS: [&str; 3] = ["local", "asia", "europe"];
pub const ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// region → environment → connection URI
    pub uris: BTreeMap<String, BTreeMap<String, String>>,
    pub default_region: String,
    pub default_environment: String,
    /// When false the requested environment is ignored in favor of the default
    pub enable_env: bool,
    pub admin_database: String,
    pub test_database: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl DatabaseConfig {
    /// Config with only the given URIs and stock names, for embedding and tests
    pub fn with_uris<I, R, E, U>(uris: I) -> Self
    where
        I: IntoIterator<Item = (R, E, U)>,
        R: Into<String>,
        E: Into<String>,
        U: Into<String>,
    {
        let mut config = Self {
            default_region: "asia".to_string(),
            default_environment: "development".to_string(),
            enable_env: true,
            admin_database: "master".to_string(),
            test_database: "test".to_string(),
            max_connections: 10,
            connection_timeout: 30,
            ..Default::default()
        };
        for (region, environment, uri) in uris {
            config.set_uri(region, environment, uri);
        }
        config
    }

    pub fn set_uri(&mut self, region: impl Into<String>, environment: impl Into<String>, uri: impl Into<String>) {
        self.uris
            .entry(region.into())
            .or_default()
            .insert(environment.into(), uri.into());
    }

    /// Connection URI for a region/environment pair
    pub fn resolve_uri(&self, region: &str, environment: &str) -> Result<String, DatabaseError> {
        let environment = if self.enable_env { environment } else { self.default_environment.as_str() };

        self.uris
            .get(region)
            .and_then(|envs| envs.get(environment))
            .filter(|uri| !uri.is_empty())
            .cloned()
            .ok_or_else(|| {
                DatabaseError::Configuration(format!("no database URI configured for {}/{}", region, environment))
            })
    }

    pub fn is_admin(&self, database: &str) -> bool {
        database == self.admin_database
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_DEFAULT_REGION") {
            self.database.default_region = v;
        }
        if let Ok(v) = env::var("DATABASE_DEFAULT_ENV") {
            self.database.default_environment = v;
        }
        if let Ok(v) = env::var("ENABLE_ENV") {
            self.database.enable_env = v.parse().unwrap_or(self.database.enable_env);
        }
        if let Ok(v) = env::var("DBNAME_ADMIN") {
            self.database.admin_database = v;
        }
        if let Ok(v) = env::var("DBNAME_TEST") {
            self.database.test_database = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            let region = self.database.default_region.clone();
            let default_env = self.database.default_environment.clone();
            self.database.set_uri(region, default_env, v);
        }
        for region in REGIONS {
            for environment in ENVIRONMENTS {
                let key = format!("DATABASE_URI_{}_{}", region.to_uppercase(), environment.to_uppercase());
                if let Ok(v) = env::var(&key) {
                    self.database.set_uri(region, environment, v);
                }
            }
        }

        // API overrides
        if let Ok(v) = env::var("DOCBASE_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        let mut database = DatabaseConfig::with_uris([("asia", "development", "memory://asia")]);
        database.enable_env = false;

        Self {
            environment: Environment::Development,
            database,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        let mut database = DatabaseConfig::with_uris(std::iter::empty::<(String, String, String)>());
        database.enable_env = false;
        database.default_environment = "staging".to_string();
        database.max_connections = 20;
        database.connection_timeout = 10;

        Self {
            environment: Environment::Staging,
            database,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        let mut database = DatabaseConfig::with_uris(std::iter::empty::<(String, String, String)>());
        database.enable_env = false;
        database.default_environment = "production".to_string();
        database.max_connections = 50;
        database.connection_timeout = 5;

        Self {
            environment: Environment::Production,
            database,
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
