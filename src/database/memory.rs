//! In-process document store
//!
//! Every URI names one cluster; all connections opened against the same URI
//! share its state, the way separate clients to one server do. Databases
//! only exist while they hold at least one collection.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::driver::{matches_filter, Connector, Document, DocumentDriver, DriverError, ID_FIELD};
use crate::schema::index::IndexDefinition;

#[derive(Default)]
struct Collection {
    docs: Vec<Document>,
    indexes: Vec<IndexDefinition>,
}

impl Collection {
    fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.indexes
            .iter()
            .filter(|index| index.is_unique())
            .flat_map(|index| index.keys.keys().map(String::as_str))
    }
}

#[derive(Default)]
struct Cluster {
    databases: BTreeMap<String, BTreeMap<String, Collection>>,
    index_calls: usize,
}

#[derive(Default)]
struct ConnectorState {
    clusters: Mutex<HashMap<String, Arc<Mutex<Cluster>>>>,
    unreachable: Mutex<HashSet<String>>,
    rejecting_indexes: Mutex<HashSet<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Opens connections to in-process clusters. Cloning shares the clusters.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    state: Arc<ConnectorState>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connect` fail for `uri` until cleared
    pub fn set_unreachable(&self, uri: &str, unreachable: bool) {
        let mut set = self.state.unreachable.lock();
        if unreachable {
            set.insert(uri.to_string());
        } else {
            set.remove(uri);
        }
    }

    /// Make index creation fail on `uri` until cleared
    pub fn set_rejecting_indexes(&self, uri: &str, rejecting: bool) {
        let mut set = self.state.rejecting_indexes.lock();
        if rejecting {
            set.insert(uri.to_string());
        } else {
            set.remove(uri);
        }
    }

    /// Total physical connections opened so far
    pub fn connections_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet closed
    pub fn connections_open(&self) -> usize {
        self.connections_opened() - self.state.closed.load(Ordering::SeqCst)
    }

    /// Storage-level index creations issued against `uri`
    pub fn index_calls(&self, uri: &str) -> usize {
        self.cluster(uri).lock().index_calls
    }

    /// Index names present on a collection
    pub fn index_names(&self, uri: &str, db: &str, collection: &str) -> Vec<String> {
        self.cluster(uri)
            .lock()
            .databases
            .get(db)
            .and_then(|collections| collections.get(collection))
            .map(|c| c.indexes.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default()
    }

    fn cluster(&self, uri: &str) -> Arc<Mutex<Cluster>> {
        self.state
            .clusters
            .lock()
            .entry(uri.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn DocumentDriver>, DriverError> {
        if self.state.unreachable.lock().contains(uri) {
            return Err(DriverError::Unreachable(uri.to_string()));
        }

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemoryDriver {
            uri: uri.to_string(),
            cluster: self.cluster(uri),
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One connection to an in-process cluster
pub struct MemoryDriver {
    uri: String,
    cluster: Arc<Mutex<Cluster>>,
    state: Arc<ConnectorState>,
    closed: AtomicBool,
}

impl MemoryDriver {
    fn check_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed(self.uri.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentDriver for MemoryDriver {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn ping(&self, _db: &str) -> Result<(), DriverError> {
        self.check_open()
    }

    async fn list_databases(&self) -> Result<Vec<String>, DriverError> {
        self.check_open()?;
        Ok(self.cluster.lock().databases.keys().cloned().collect())
    }

    async fn drop_database(&self, db: &str) -> Result<(), DriverError> {
        self.check_open()?;
        self.cluster.lock().databases.remove(db);
        Ok(())
    }

    async fn list_collections(&self, db: &str) -> Result<Vec<String>, DriverError> {
        self.check_open()?;
        Ok(self
            .cluster
            .lock()
            .databases
            .get(db)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_collection(&self, db: &str, name: &str) -> Result<(), DriverError> {
        self.check_open()?;
        self.cluster
            .lock()
            .databases
            .entry(db.to_string())
            .or_default()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn drop_collection(&self, db: &str, name: &str) -> Result<(), DriverError> {
        self.check_open()?;
        let mut cluster = self.cluster.lock();
        if let Some(collections) = cluster.databases.get_mut(db) {
            collections.remove(name);
            if collections.is_empty() {
                cluster.databases.remove(db);
            }
        }
        Ok(())
    }

    async fn rename_collection(&self, db: &str, from: &str, to: &str) -> Result<(), DriverError> {
        self.check_open()?;
        let mut cluster = self.cluster.lock();
        let collections = cluster
            .databases
            .get_mut(db)
            .ok_or_else(|| DriverError::NotFound(format!("database {}", db)))?;
        if collections.contains_key(to) {
            return Err(DriverError::Query(format!("target collection {} already exists", to)));
        }
        let collection = collections
            .remove(from)
            .ok_or_else(|| DriverError::NotFound(format!("collection {}", from)))?;
        collections.insert(to.to_string(), collection);
        Ok(())
    }

    async fn insert_one(&self, db: &str, collection: &str, mut doc: Document) -> Result<String, DriverError> {
        self.check_open()?;
        let id = match doc.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            _ => Uuid::new_v4().to_string(),
        };
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut cluster = self.cluster.lock();
        let target = cluster
            .databases
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        for field in target.unique_fields() {
            let value = doc.get(field);
            if value.is_some() && target.docs.iter().any(|existing| existing.get(field) == value) {
                return Err(DriverError::DuplicateKey {
                    collection: collection.to_string(),
                    field: field.to_string(),
                });
            }
        }
        if target.docs.iter().any(|existing| existing.get(ID_FIELD) == doc.get(ID_FIELD)) {
            return Err(DriverError::DuplicateKey {
                collection: collection.to_string(),
                field: ID_FIELD.to_string(),
            });
        }

        target.docs.push(doc);
        Ok(id)
    }

    async fn find(&self, db: &str, collection: &str, filter: &Document) -> Result<Vec<Document>, DriverError> {
        self.check_open()?;
        let cluster = self.cluster.lock();
        Ok(cluster
            .databases
            .get(db)
            .and_then(|collections| collections.get(collection))
            .map(|c| {
                c.docs
                    .iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_many(
        &self,
        db: &str,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> Result<u64, DriverError> {
        self.check_open()?;
        let mut cluster = self.cluster.lock();
        let Some(target) = cluster
            .databases
            .get_mut(db)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(0);
        };

        let mut updated = 0;
        for doc in target.docs.iter_mut().filter(|doc| matches_filter(doc, filter)) {
            for (key, value) in set {
                if key != ID_FIELD {
                    doc.insert(key.clone(), value.clone());
                }
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_many(&self, db: &str, collection: &str, filter: &Document) -> Result<u64, DriverError> {
        self.check_open()?;
        let mut cluster = self.cluster.lock();
        let Some(target) = cluster
            .databases
            .get_mut(db)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(0);
        };

        let before = target.docs.len();
        target.docs.retain(|doc| !matches_filter(doc, filter));
        Ok((before - target.docs.len()) as u64)
    }

    async fn create_index(&self, db: &str, collection: &str, index: &IndexDefinition) -> Result<(), DriverError> {
        self.check_open()?;
        let mut cluster = self.cluster.lock();
        cluster.index_calls += 1;
        if self.state.rejecting_indexes.lock().contains(&self.uri) {
            return Err(DriverError::Query(format!("index {} rejected by {}", index.name, self.uri)));
        }
        let target = cluster
            .databases
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();
        target.indexes.retain(|existing| existing.name != index.name);
        target.indexes.push(index.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
