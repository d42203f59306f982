use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::record::{prepare_insert, prepare_update, RecordError};
use crate::database::driver::{filter_of, Document, DocumentDriver, DriverError};
use crate::schema::{DescriptorMap, FieldDescriptor};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Typed access to one collection, built from its SchemaRecord on each
/// acquisition and never persisted.
pub struct ModelHandle {
    name: String,
    database: String,
    fields: DescriptorMap,
    driver: Arc<dyn DocumentDriver>,
}

impl ModelHandle {
    pub fn new(name: impl Into<String>, database: impl Into<String>, fields: DescriptorMap, driver: Arc<dyn DocumentDriver>) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            fields,
            driver,
        }
    }

    /// Collection this model reads and writes
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn fields(&self) -> &DescriptorMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Document as it would be stored, without writing it
    pub fn prepare(&self, doc: &Document) -> Result<Document, RecordError> {
        prepare_insert(&self.fields, doc)
    }

    pub async fn insert_one(&self, doc: &Document) -> Result<String, ModelError> {
        let prepared = self.prepare(doc)?;
        self.check_unique(&prepared).await?;
        let id = self.driver.insert_one(&self.database, &self.name, prepared).await?;
        debug!("Inserted {} into {}.{}", id, self.database, self.name);
        Ok(id)
    }

    /// Insert in order, stopping at the first failure
    pub async fn insert_many(&self, docs: &[Document]) -> Result<Vec<String>, ModelError> {
        let mut ids = Vec::with_capacity(docs.len());
        for doc in docs {
            ids.push(self.insert_one(doc).await?);
        }
        Ok(ids)
    }

    pub async fn find(&self, filter: &Document) -> Result<Vec<Document>, ModelError> {
        Ok(self.driver.find(&self.database, &self.name, filter).await?)
    }

    pub async fn find_one(&self, filter: &Document) -> Result<Option<Document>, ModelError> {
        Ok(self.find(filter).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &Document) -> Result<usize, ModelError> {
        Ok(self.find(filter).await?.len())
    }

    pub async fn update_many(&self, filter: &Document, set: &Document) -> Result<u64, ModelError> {
        let set = prepare_update(&self.fields, set)?;
        if set.is_empty() {
            return Ok(0);
        }
        Ok(self.driver.update_many(&self.database, &self.name, filter, &set).await?)
    }

    pub async fn delete_many(&self, filter: &Document) -> Result<u64, ModelError> {
        Ok(self.driver.delete_many(&self.database, &self.name, filter).await?)
    }

    async fn check_unique(&self, doc: &Document) -> Result<(), ModelError> {
        for name in self.fields.iter().filter(|(_, field)| field.unique).map(|(name, _)| name) {
            let Some(value) = doc.get(name).filter(|value| !value.is_null()) else {
                continue;
            };
            let existing = self
                .driver
                .find(&self.database, &self.name, &filter_of([(name.as_str(), value.clone())]))
                .await?;
            if !existing.is_empty() {
                return Err(RecordError::DuplicateValue {
                    field: name.clone(),
                    value: display(value),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("database", &self.database)
            .field("fields", &self.fields)
            .finish()
    }
}
