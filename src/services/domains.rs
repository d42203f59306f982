use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::driver::Document;
use crate::database::{ConnectionRegistry, DatabaseError};
use crate::templates::APPS_COLLECTION;

/// Allowed cross-origin domains, derived per physical client from the admin
/// database's `apps` records.
pub struct DomainRegistry {
    registry: Arc<ConnectionRegistry>,
    snapshot: RwLock<Vec<String>>,
}

impl DomainRegistry {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            snapshot: RwLock::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Re-derive every client's domain set after a tenant change in `database`.
    /// Only the admin database is authoritative; other names are a no-op.
    pub async fn recompute(&self, database: &str) -> Result<(), DatabaseError> {
        if !self.registry.config().is_admin(database) {
            debug!("Skipping domain recompute for non-admin database {}", database);
            return Ok(());
        }

        for client in self.registry.clients().await {
            let driver = client.driver();
            if !driver.list_databases().await?.iter().any(|name| name == database) {
                continue;
            }
            if !driver.list_collections(database).await?.iter().any(|name| name == APPS_COLLECTION) {
                continue;
            }

            let apps = driver.find(database, APPS_COLLECTION, &Document::new()).await?;
            let domains = collect_domains(&apps);
            info!("Derived {} allowed domains for {}", domains.len(), client.uri());
            client.set_domains(domains);
        }

        let all = self.get_all().await;
        *self.snapshot.write() = dedupe(all);
        Ok(())
    }

    /// Domain sets of every pooled client, concatenated
    pub async fn get_all(&self) -> Vec<String> {
        self.registry
            .clients()
            .await
            .iter()
            .flat_map(|client| client.domains())
            .collect()
    }

    /// Domains as of the last recompute, without touching the pool
    pub fn allowed_origins(&self) -> Vec<String> {
        self.snapshot.read().clone()
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.snapshot.read().iter().any(|domain| domain == origin)
    }
}

/// Union of every record's `domains`, first occurrence kept
pub fn collect_domains(apps: &[Document]) -> Vec<String> {
    dedupe(apps.iter().flat_map(|app| parse_domains(app.get("domains"))).collect())
}

/// A record's `domains` field: JSON text holding an array of strings.
/// Anything unparseable contributes nothing.
pub fn parse_domains(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("Ignoring malformed domains {:?}: {}", text, e);
                Vec::new()
            }
        },
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(domain) => Some(domain),
            _ => None,
        })
        .collect()
}

fn dedupe(domains: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    domains.into_iter().filter(|domain| seen.insert(domain.clone())).collect()
}
