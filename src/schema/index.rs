use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A storage index declared by a SchemaRecord
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Unique within collection + connection
    #[serde(default)]
    pub name: String,

    /// Field → sort direction, in declaration order
    #[serde(default)]
    pub keys: Map<String, Value>,

    /// Engine-specific options (`unique`, `expireAfterSeconds`, ...)
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, keys: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            keys,
            options: Map::new(),
        }
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = options;
        self
    }

    /// Key used in a connection's applied-index set
    pub fn applied_key(&self, collection: &str) -> String {
        format!("{}.{}", collection, self.name)
    }

    pub fn is_unique(&self) -> bool {
        self.options.get("unique").and_then(Value::as_bool).unwrap_or(false)
    }

    /// TTL in seconds, when the index expires documents
    pub fn expire_after_seconds(&self) -> Option<u64> {
        self.options.get("expireAfterSeconds").and_then(Value::as_u64)
    }

    /// Sort direction for a key; anything other than a negative number is ascending
    pub fn is_descending(direction: &Value) -> bool {
        direction.as_i64().map(|d| d < 0).unwrap_or(false)
    }
}

/// Parse a stored `indices` JSON string. Missing or blank text is an empty list.
pub fn parse_indices(text: Option<&str>) -> Result<Vec<IndexDefinition>, serde_json::Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str::<Option<Vec<IndexDefinition>>>(text).map(Option::unwrap_or_default),
    }
}
