use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::index::{parse_indices, IndexDefinition};
use crate::database::driver::{filter_of, Document, DriverError};
use crate::database::DatabaseHandle;

/// Meta-collection holding one SchemaRecord per collection
pub const SCHEMAS_COLLECTION: &str = "schemas";

/// Persisted description of a collection's fields and indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub name: String,
    /// JSON text: field name → type descriptor
    pub definition: String,
    /// JSON text: array of index definitions
    pub indices: String,
}

impl SchemaRecord {
    pub fn new(name: impl Into<String>, definition: &Value, indices: &[IndexDefinition]) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: name.into(),
            definition: definition_text(definition),
            indices: serde_json::to_string(indices)?,
        })
    }

    /// Read a stored document. Non-string columns are kept as their JSON text.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let name = doc.get("name")?.as_str()?.to_string();
        Some(Self {
            name,
            definition: doc.get("definition").map(definition_text).unwrap_or_default(),
            indices: doc.get("indices").map(definition_text).unwrap_or_default(),
        })
    }

    pub fn index_definitions(&self) -> Result<Vec<IndexDefinition>, serde_json::Error> {
        parse_indices(Some(&self.indices))
    }

    pub fn to_document(&self) -> Document {
        filter_of([
            ("name", self.name.as_str()),
            ("definition", self.definition.as_str()),
            ("indices", self.indices.as_str()),
        ])
    }
}

fn definition_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Stored record for `collection`, or `None` when it has no schema
pub async fn get_definition(conn: &DatabaseHandle, collection: &str) -> Result<Option<SchemaRecord>, DriverError> {
    let docs = conn
        .driver()
        .find(conn.name(), SCHEMAS_COLLECTION, &filter_of([("name", collection)]))
        .await?;
    Ok(docs.iter().find_map(SchemaRecord::from_document))
}

/// Write or overwrite the record for `collection`
pub async fn set_definition(
    conn: &DatabaseHandle,
    collection: &str,
    definition: &Value,
    indices: &[IndexDefinition],
) -> Result<SchemaRecord, DriverError> {
    let record = SchemaRecord::new(collection, definition, indices)?;
    let filter = filter_of([("name", collection)]);
    let driver = conn.driver();

    let updated = driver
        .update_many(conn.name(), SCHEMAS_COLLECTION, &filter, &record.to_document())
        .await?;
    if updated == 0 {
        driver
            .insert_one(conn.name(), SCHEMAS_COLLECTION, record.to_document())
            .await?;
    }

    debug!("Stored schema for {}.{}", conn.name(), collection);
    Ok(record)
}

pub async fn remove_definition(conn: &DatabaseHandle, collection: &str) -> Result<u64, DriverError> {
    conn.driver()
        .delete_many(conn.name(), SCHEMAS_COLLECTION, &filter_of([("name", collection)]))
        .await
}

pub async fn rename_definition(conn: &DatabaseHandle, from: &str, to: &str) -> Result<u64, DriverError> {
    conn.driver()
        .update_many(
            conn.name(),
            SCHEMAS_COLLECTION,
            &filter_of([("name", from)]),
            &filter_of([("name", to)]),
        )
        .await
}

pub async fn list_definitions(conn: &DatabaseHandle) -> Result<Vec<SchemaRecord>, DriverError> {
    let docs = conn
        .driver()
        .find(conn.name(), SCHEMAS_COLLECTION, &Document::new())
        .await?;
    Ok(docs.iter().filter_map(SchemaRecord::from_document).collect())
}
