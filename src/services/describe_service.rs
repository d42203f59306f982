use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::database::driver::DriverError;
use crate::database::DatabaseHandle;
use crate::schema::store::{list_definitions, remove_definition, rename_definition};
use crate::schema::{compile, get_definition, set_definition, IndexDefinition, SchemaError, SchemaRecord, SCHEMAS_COLLECTION};
use crate::templates::INIT_COLLECTION;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("Collection not found: {0}")]
    NotFound(String),
    #[error("Collection already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),
    #[error("Collection is protected: {0}")]
    Protected(String),
    #[error("Failed to {action} collection: {name}")]
    Unconfirmed { action: &'static str, name: String },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// A collection joined with its stored schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    /// Stored field map, when there is a parseable one
    pub definition: Option<Value>,
    pub indices: Vec<IndexDefinition>,
}

impl CollectionInfo {
    fn new(name: &str, record: Option<&SchemaRecord>) -> Self {
        Self {
            name: name.to_string(),
            definition: record.and_then(|r| serde_json::from_str(&r.definition).ok()),
            indices: record.and_then(|r| r.index_definitions().ok()).unwrap_or_default(),
        }
    }
}

/// Collection management over one tenant database
pub struct DescribeService {
    conn: Arc<DatabaseHandle>,
}

impl DescribeService {
    pub fn new(conn: Arc<DatabaseHandle>) -> Self {
        Self { conn }
    }

    /// Every collection with its schema, if recorded
    pub async fn list(&self) -> Result<Vec<CollectionInfo>, DescribeError> {
        let records: HashMap<String, SchemaRecord> = list_definitions(&self.conn)
            .await?
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        Ok(self
            .collections()
            .await?
            .iter()
            .filter(|name| name.as_str() != INIT_COLLECTION)
            .map(|name| CollectionInfo::new(name, records.get(name)))
            .collect())
    }

    pub async fn select_one(&self, name: &str) -> Result<Option<CollectionInfo>, DescribeError> {
        if !self.exists(name).await? {
            return Ok(None);
        }
        let record = get_definition(&self.conn, name).await?;
        Ok(Some(CollectionInfo::new(name, record.as_ref())))
    }

    /// Get collection by name, return 404 error if not found
    pub async fn select_404(&self, name: &str) -> Result<CollectionInfo, DescribeError> {
        self.select_one(name)
            .await?
            .ok_or_else(|| DescribeError::NotFound(name.to_string()))
    }

    /// Create a collection and record its schema
    pub async fn create_one(
        &self,
        name: &str,
        definition: &Value,
        indices: &[IndexDefinition],
    ) -> Result<CollectionInfo, DescribeError> {
        self.validate_collection_protection(name)?;
        self.validate_definition(definition)?;
        if self.exists(name).await? {
            return Err(DescribeError::AlreadyExists(name.to_string()));
        }

        self.conn.driver().create_collection(self.conn.name(), name).await?;
        if !self.exists(name).await? {
            return Err(DescribeError::Unconfirmed { action: "create", name: name.to_string() });
        }

        let record = set_definition(&self.conn, name, definition, indices).await?;
        info!("Created collection {}.{}", self.conn.name(), name);
        Ok(CollectionInfo::new(name, Some(&record)))
    }

    /// Replace the schema of an existing collection
    pub async fn update_404(
        &self,
        name: &str,
        definition: &Value,
        indices: &[IndexDefinition],
    ) -> Result<CollectionInfo, DescribeError> {
        self.validate_collection_protection(name)?;
        self.validate_definition(definition)?;
        if !self.exists(name).await? {
            return Err(DescribeError::NotFound(name.to_string()));
        }

        let record = set_definition(&self.conn, name, definition, indices).await?;
        self.conn.discard_model(name);
        info!("Updated schema for {}.{}", self.conn.name(), name);
        Ok(CollectionInfo::new(name, Some(&record)))
    }

    pub async fn rename(&self, source: &str, target: &str) -> Result<CollectionInfo, DescribeError> {
        self.validate_collection_protection(source)?;
        self.validate_collection_protection(target)?;
        if !self.exists(source).await? {
            return Err(DescribeError::NotFound(source.to_string()));
        }
        if self.exists(target).await? {
            return Err(DescribeError::AlreadyExists(target.to_string()));
        }

        self.conn.driver().rename_collection(self.conn.name(), source, target).await?;
        rename_definition(&self.conn, source, target).await?;
        self.conn.discard_model(source);

        info!("Renamed collection {}.{} -> {}", self.conn.name(), source, target);
        self.select_404(target).await
    }

    /// Drop a collection and its schema. Returns false if it did not exist.
    pub async fn delete_one(&self, name: &str) -> Result<bool, DescribeError> {
        self.validate_collection_protection(name)?;
        if !self.exists(name).await? {
            return Ok(false);
        }

        self.conn.driver().drop_collection(self.conn.name(), name).await?;
        if self.exists(name).await? {
            return Err(DescribeError::Unconfirmed { action: "drop", name: name.to_string() });
        }
        remove_definition(&self.conn, name).await?;
        self.conn.discard_model(name);

        info!("Dropped collection {}.{}", self.conn.name(), name);
        Ok(true)
    }

    /// Delete collection by name, return 404 error if not found
    pub async fn delete_404(&self, name: &str) -> Result<(), DescribeError> {
        if self.delete_one(name).await? {
            Ok(())
        } else {
            Err(DescribeError::NotFound(name.to_string()))
        }
    }

    // Private helper methods

    async fn collections(&self) -> Result<Vec<String>, DescribeError> {
        Ok(self.conn.driver().list_collections(self.conn.name()).await?)
    }

    async fn exists(&self, name: &str) -> Result<bool, DescribeError> {
        Ok(self.collections().await?.iter().any(|c| c == name))
    }

    fn validate_collection_protection(&self, name: &str) -> Result<(), DescribeError> {
        if name.is_empty() || name.contains('$') || name.contains('\0') {
            return Err(DescribeError::InvalidFormat(format!("invalid collection name: {:?}", name)));
        }
        if name == SCHEMAS_COLLECTION || name == INIT_COLLECTION {
            return Err(DescribeError::Protected(name.to_string()));
        }
        Ok(())
    }

    fn validate_definition(&self, definition: &Value) -> Result<(), DescribeError> {
        match compile(definition)? {
            Some(_) => Ok(()),
            None => Err(DescribeError::InvalidFormat("definition must be a JSON object".to_string())),
        }
    }
}
