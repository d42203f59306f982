use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::index::IndexDefinition;
use super::types::{DescriptorMap, FieldDescriptor, TypeDescriptor};
use super::SchemaError;
use crate::database::DatabaseHandle;
use crate::model::ModelHandle;

/// Compile a stored definition into a descriptor map.
///
/// A string is parsed first. Text that does not parse, or that parses to
/// something other than an object, yields `Ok(None)`: there is no model yet.
/// A field naming a type outside the vocabulary is a hard error.
pub fn compile(definition: &Value) -> Result<Option<DescriptorMap>, SchemaError> {
    match definition {
        Value::String(text) => compile_str(text),
        Value::Object(fields) => compile_fields(fields).map(Some),
        Value::Null => Ok(None),
        other => {
            warn!("Schema definition is not an object: {}", other);
            Ok(None)
        }
    }
}

pub fn compile_str(text: &str) -> Result<Option<DescriptorMap>, SchemaError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => compile_fields(&fields).map(Some),
        Ok(_) => Ok(None),
        Err(e) => {
            warn!("Unparseable schema definition: {}", e);
            Ok(None)
        }
    }
}

fn compile_fields(fields: &Map<String, Value>) -> Result<DescriptorMap, SchemaError> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), compile_field(value)?)))
        .collect()
}

/// Compile one field: a bare type name, or an object carrying `type`
pub fn compile_field(value: &Value) -> Result<FieldDescriptor, SchemaError> {
    match value {
        Value::String(name) => TypeDescriptor::from_name(name)
            .map(FieldDescriptor::new)
            .ok_or_else(|| SchemaError::UnsupportedType(name.clone())),
        Value::Object(spec) => compile_typed_field(spec),
        other => Err(SchemaError::UnsupportedType(other.to_string())),
    }
}

fn compile_typed_field(spec: &Map<String, Value>) -> Result<FieldDescriptor, SchemaError> {
    let type_name = match spec.get("type") {
        Some(Value::String(name)) => name.as_str(),
        Some(other) => return Err(SchemaError::UnsupportedType(other.to_string())),
        None => return Err(SchemaError::UnsupportedType(Value::Object(spec.clone()).to_string())),
    };

    let kind = match (type_name, spec.get("items")) {
        ("Array", Some(items)) if !items.is_null() => {
            let item = compile_field(items).map_err(|e| match e {
                SchemaError::UnsupportedType(name) => SchemaError::UnsupportedArrayItem(name),
                other => other,
            })?;
            TypeDescriptor::Array(Box::new(item))
        }
        (name, _) => TypeDescriptor::from_name(name).ok_or_else(|| SchemaError::UnsupportedType(name.to_string()))?,
    };

    let mut field = FieldDescriptor::new(kind);
    for (key, value) in spec {
        match (key.as_str(), value) {
            ("type", _) | ("items", _) => {}
            ("required", Value::Bool(flag)) => field.required = *flag,
            ("unique", Value::Bool(flag)) => field.unique = *flag,
            ("default", value) => field.default = Some(value.clone()),
            ("ref", Value::String(target)) => field.reference = Some(target.clone()),
            (key, value) => {
                field.extra.insert(key.to_string(), value.clone());
            }
        }
    }
    Ok(field)
}

/// Apply one index to storage unless this connection already has it.
///
/// An index without a name or keys, or an empty collection name, leaves the
/// model untouched. Returns `None` when the storage call fails, meaning the
/// model must not be used.
pub async fn apply_index(
    conn: &DatabaseHandle,
    model: Arc<ModelHandle>,
    collection: &str,
    index: &IndexDefinition,
) -> Option<Arc<ModelHandle>> {
    if collection.is_empty() || index.name.is_empty() || index.keys.is_empty() {
        debug!("Skipping incomplete index on {}: {:?}", collection, index.name);
        return Some(model);
    }

    let key = index.applied_key(collection);
    if conn.is_index_applied(&key) {
        return Some(model);
    }

    match conn.driver().create_index(conn.name(), collection, index).await {
        Ok(()) => {
            conn.mark_index_applied(key);
            debug!("Applied index {}.{} on {}", collection, index.name, conn.name());
            Some(model)
        }
        Err(e) => {
            warn!("Failed to apply index {}.{} on {}: {}", collection, index.name, conn.name(), e);
            None
        }
    }
}
