use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::driver::DocumentDriver;
use crate::model::ModelHandle;

/// A pooled connection to one server, shared by every database on it
pub struct PhysicalClient {
    uri: String,
    driver: Arc<dyn DocumentDriver>,
    domains: RwLock<Vec<String>>,
}

impl PhysicalClient {
    pub fn new(uri: impl Into<String>, driver: Arc<dyn DocumentDriver>) -> Self {
        Self {
            uri: uri.into(),
            driver,
            domains: RwLock::new(Vec::new()),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn driver(&self) -> &Arc<dyn DocumentDriver> {
        &self.driver
    }

    /// Allowed origins last derived from this client's admin `apps` records
    pub fn domains(&self) -> Vec<String> {
        self.domains.read().clone()
    }

    pub fn set_domains(&self, domains: Vec<String>) {
        *self.domains.write() = domains;
    }
}

impl std::fmt::Debug for PhysicalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalClient")
            .field("uri", &self.uri)
            .field("domains", &*self.domains.read())
            .finish()
    }
}

/// Session scoped to one logical database, cached per (URI, name)
pub struct DatabaseHandle {
    uri: String,
    name: String,
    driver: Arc<dyn DocumentDriver>,
    applied_indices: Mutex<HashSet<String>>,
    models: Mutex<HashMap<String, Arc<ModelHandle>>>,
}

impl DatabaseHandle {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, driver: Arc<dyn DocumentDriver>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            driver,
            applied_indices: Mutex::new(HashSet::new()),
            models: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for a database on a server
    pub fn cache_key(uri: &str, name: &str) -> String {
        format!("{}_{}", uri, name)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &Arc<dyn DocumentDriver> {
        &self.driver
    }

    pub fn is_index_applied(&self, key: &str) -> bool {
        self.applied_indices.lock().contains(key)
    }

    /// Returns false when the key was already present
    pub fn mark_index_applied(&self, key: String) -> bool {
        self.applied_indices.lock().insert(key)
    }

    pub fn applied_indices(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.applied_indices.lock().iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Model most recently built for `collection` on this connection
    pub fn model(&self, collection: &str) -> Option<Arc<ModelHandle>> {
        self.models.lock().get(collection).cloned()
    }

    pub fn register_model(&self, model: Arc<ModelHandle>) {
        self.models.lock().insert(model.name().to_string(), model);
    }

    pub fn discard_model(&self, collection: &str) -> Option<Arc<ModelHandle>> {
        self.models.lock().remove(collection)
    }
}

impl std::fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseHandle")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .finish()
    }
}
