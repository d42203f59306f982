//! Storage driver seam
//!
//! Everything above this module talks to a document store through
//! `DocumentDriver`. A driver is one physical connection to a server that
//! can address many logical databases, each holding named collections of
//! JSON documents.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::schema::index::IndexDefinition;

/// A stored document. `_id` carries the storage identifier on reads.
pub type Document = Map<String, Value>;

/// Identifier field injected into documents returned by `find`
pub const ID_FIELD: &str = "_id";

/// Errors raised by storage drivers
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Duplicate key on {collection}.{field}")]
    DuplicateKey { collection: String, field: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One physical connection to a document server
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// URI this connection was opened against
    fn uri(&self) -> &str;

    /// Confirm the logical database `db` answers on this connection
    async fn ping(&self, db: &str) -> Result<(), DriverError>;

    /// Names of every materialized logical database
    async fn list_databases(&self) -> Result<Vec<String>, DriverError>;

    async fn drop_database(&self, db: &str) -> Result<(), DriverError>;

    async fn list_collections(&self, db: &str) -> Result<Vec<String>, DriverError>;

    /// Create a collection. Creating an existing collection is a no-op.
    async fn create_collection(&self, db: &str, name: &str) -> Result<(), DriverError>;

    async fn drop_collection(&self, db: &str, name: &str) -> Result<(), DriverError>;

    async fn rename_collection(&self, db: &str, from: &str, to: &str) -> Result<(), DriverError>;

    /// Insert a document, creating the collection (and database) on demand.
    /// Returns the stored identifier.
    async fn insert_one(&self, db: &str, collection: &str, doc: Document) -> Result<String, DriverError>;

    /// Documents whose top-level fields equal every entry of `filter`
    async fn find(&self, db: &str, collection: &str, filter: &Document) -> Result<Vec<Document>, DriverError>;

    /// Merge `set` into every matching document
    async fn update_many(
        &self,
        db: &str,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> Result<u64, DriverError>;

    async fn delete_many(&self, db: &str, collection: &str, filter: &Document) -> Result<u64, DriverError>;

    /// Issue a storage-level index creation
    async fn create_index(&self, db: &str, collection: &str, index: &IndexDefinition) -> Result<(), DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// Opens physical connections. Every call yields a new connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn DocumentDriver>, DriverError>;
}

/// Dispatches on URI scheme: `memory://` goes to the in-process cluster,
/// `postgres://` and `postgresql://` to the Postgres document driver.
pub struct SchemeConnector {
    memory: crate::database::memory::MemoryConnector,
    postgres: crate::database::postgres::PgConnector,
}

impl SchemeConnector {
    pub fn new(
        memory: crate::database::memory::MemoryConnector,
        postgres: crate::database::postgres::PgConnector,
    ) -> Self {
        Self { memory, postgres }
    }
}

#[async_trait]
impl Connector for SchemeConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn DocumentDriver>, DriverError> {
        match uri.split_once("://").map(|(scheme, _)| scheme) {
            Some("memory") => self.memory.connect(uri).await,
            Some("postgres") | Some("postgresql") => self.postgres.connect(uri).await,
            _ => Err(DriverError::Unreachable(format!("unsupported URI scheme: {}", uri))),
        }
    }
}

/// True when every filter entry equals the document's field of the same name
pub fn matches_filter(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| doc.get(key) == Some(expected))
}

/// Build an equality filter from `(field, value)` pairs
pub fn filter_of<I, K, V>(pairs: I) -> Document
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
