use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::driver::{Document, ID_FIELD};
use crate::schema::{DescriptorMap, FieldDescriptor, TypeDescriptor};

/// Errors raised while checking a document against a compiled schema
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Invalid value for field '{field}': expected {expected}, got {value}")]
    InvalidType {
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("Duplicate value for unique field '{field}': {value}")]
    DuplicateValue { field: String, value: String },
}

/// Check a full document for insertion. Applies defaults, drops undeclared
/// fields and keeps `_id` when present.
pub fn prepare_insert(fields: &DescriptorMap, doc: &Document) -> Result<Document, RecordError> {
    let mut out = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD.to_string(), id.clone());
    }

    for (name, field) in fields {
        match doc.get(name) {
            Some(value) => {
                check_value(name, field, value)?;
                out.insert(name.clone(), value.clone());
            }
            None => match &field.default {
                Some(default) => {
                    out.insert(name.clone(), default.clone());
                }
                None if field.required => return Err(RecordError::MissingRequiredField(name.clone())),
                None => {}
            },
        }
    }
    Ok(out)
}

/// Check a partial document used as an update. Only fields present are checked.
pub fn prepare_update(fields: &DescriptorMap, set: &Document) -> Result<Document, RecordError> {
    let mut out = Document::new();
    for (name, value) in set {
        if let Some(field) = fields.get(name) {
            check_value(name, field, value)?;
            out.insert(name.clone(), value.clone());
        }
    }
    Ok(out)
}

pub fn check_value(name: &str, field: &FieldDescriptor, value: &Value) -> Result<(), RecordError> {
    if value.is_null() {
        if field.required {
            return Err(RecordError::MissingRequiredField(name.to_string()));
        }
        return Ok(());
    }

    let valid = match &field.kind {
        TypeDescriptor::String => value.is_string(),
        TypeDescriptor::Number => value.is_number(),
        TypeDescriptor::Boolean => value.is_boolean(),
        TypeDescriptor::Date => is_date(value),
        TypeDescriptor::Object | TypeDescriptor::Map => value.is_object(),
        TypeDescriptor::Mixed => true,
        TypeDescriptor::ObjectId => value.as_str().map(is_object_id).unwrap_or(false),
        TypeDescriptor::Buffer => is_buffer(value),
        TypeDescriptor::Array(item) => {
            let Some(items) = value.as_array() else {
                return Err(invalid(name, "Array", value));
            };
            for (i, entry) in items.iter().enumerate() {
                check_value(&format!("{}[{}]", name, i), item, entry)?;
            }
            true
        }
    };

    if !valid {
        return Err(invalid(name, field.kind.name(), value));
    }
    Ok(())
}

fn invalid(name: &str, expected: &'static str, value: &Value) -> RecordError {
    RecordError::InvalidType {
        field: name.to_string(),
        expected,
        value: value.to_string(),
    }
}

fn is_date(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(text) => {
            DateTime::parse_from_rfc3339(text).is_ok() || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        }
        _ => false,
    }
}

/// 24 hex characters, or a UUID
fn is_object_id(text: &str) -> bool {
    (text.len() == 24 && text.chars().all(|c| c.is_ascii_hexdigit())) || Uuid::parse_str(text).is_ok()
}

fn is_buffer(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(bytes) => bytes.iter().all(|b| b.as_u64().map(|b| b <= 255).unwrap_or(false)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compile;
    use serde_json::json;

    fn users() -> DescriptorMap {
        compile(&json!({
            "email": { "type": "String", "required": true, "unique": true },
            "emailConfirmed": { "type": "Boolean", "default": false },
            "UserType": { "type": "Array", "items": { "type": "ObjectId", "ref": "UserType" } },
            "createdAt": { "type": "Date" },
            "avatar": "Buffer"
        }))
        .unwrap()
        .unwrap()
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_applies_defaults_and_drops_unknown() {
        let prepared = prepare_insert(&users(), &doc(json!({ "email": "a@b.c", "nickname": "x" }))).unwrap();

        assert_eq!(prepared, doc(json!({ "email": "a@b.c", "emailConfirmed": false })));
    }

    #[test]
    fn insert_requires_required_fields() {
        let err = prepare_insert(&users(), &doc(json!({ "emailConfirmed": true }))).unwrap_err();
        assert_eq!(err, RecordError::MissingRequiredField("email".into()));

        let err = prepare_insert(&users(), &doc(json!({ "email": null }))).unwrap_err();
        assert_eq!(err, RecordError::MissingRequiredField("email".into()));
    }

    #[test]
    fn kinds_are_checked() {
        let fields = users();
        let ok = doc(json!({
            "email": "a@b.c",
            "UserType": ["65f1c0ffee00000000000001", "6f2d8c0a-3b0c-4a8e-9a55-0d6a1f3b2e11"],
            "createdAt": "2024-03-01T10:00:00Z",
            "avatar": [0, 255]
        }));
        assert!(prepare_insert(&fields, &ok).is_ok());

        let bad_item = doc(json!({ "email": "a@b.c", "UserType": ["nope"] }));
        assert!(matches!(
            prepare_insert(&fields, &bad_item),
            Err(RecordError::InvalidType { field, expected: "ObjectId", .. }) if field == "UserType[0]"
        ));

        let bad_date = doc(json!({ "email": "a@b.c", "createdAt": "yesterday" }));
        assert!(prepare_insert(&fields, &bad_date).is_err());

        let bad_buffer = doc(json!({ "email": "a@b.c", "avatar": [256] }));
        assert!(prepare_insert(&fields, &bad_buffer).is_err());
    }

    #[test]
    fn update_checks_only_present_fields() {
        let set = prepare_update(&users(), &doc(json!({ "emailConfirmed": true, "other": 1 }))).unwrap();
        assert_eq!(set, doc(json!({ "emailConfirmed": true })));

        assert!(prepare_update(&users(), &doc(json!({ "emailConfirmed": "yes" }))).is_err());
    }
}
