//! Built-in system collections seeded into every tenant database

pub mod v1;

use serde_json::{Map, Value};

use crate::database::driver::Document;
use crate::schema::IndexDefinition;

/// Collection holding tenant records and their allowed domains
pub const APPS_COLLECTION: &str = "apps";

/// Sentinel collection that forces a new database to exist
pub const INIT_COLLECTION: &str = "_init";

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateNames {
    pub collection: &'static str,
    pub model: &'static str,
}

/// One system collection: its stored field map, indices and fixture rows
#[derive(Debug, Clone)]
pub struct Template {
    pub names: TemplateNames,
    pub map: Value,
    pub indices: Vec<IndexDefinition>,
    pub data: Vec<Document>,
    /// Only created in the admin database
    pub admin_only: bool,
}

impl Template {
    fn new(collection: &'static str, model: &'static str, map: Value) -> Self {
        Self {
            names: TemplateNames { collection, model },
            map: with_timestamps(map),
            indices: Vec::new(),
            data: Vec::new(),
            admin_only: false,
        }
    }

    fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    fn indices(mut self, indices: Vec<IndexDefinition>) -> Self {
        self.indices = indices;
        self
    }

    fn data(mut self, rows: Value) -> Self {
        self.data = match rows {
            Value::Array(rows) => rows
                .into_iter()
                .filter_map(|row| match row {
                    Value::Object(doc) => Some(doc),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        self
    }

    pub fn collection(&self) -> &'static str {
        self.names.collection
    }
}

fn with_timestamps(mut map: Value) -> Value {
    if let Value::Object(fields) = &mut map {
        for name in ["createdAt", "updatedAt"] {
            let mut stamp = Map::new();
            stamp.insert("type".into(), Value::String("Date".into()));
            fields.insert(name.into(), Value::Object(stamp));
        }
    }
    map
}

/// Index on `field` with no options
fn plain_index(field: &str) -> IndexDefinition {
    let mut keys = Map::new();
    keys.insert(field.to_string(), Value::from(1));
    IndexDefinition::new(field, keys)
}

/// TTL index expiring documents at their `expiresAt`
fn expires_at_index() -> IndexDefinition {
    let mut options = Map::new();
    options.insert("expireAfterSeconds".into(), Value::from(0));
    plain_index("expiresAt").with_options(options)
}
