use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{ModelHandle, RegistryError};
use crate::database::DatabaseHandle;
use crate::schema::{apply_index, compile_str, get_definition, SchemaError};

/// Collections the generic CRUD surface may not reach
pub const PROTECTED_COLLECTIONS: [&str; 6] = ["schemas", "apps", "users", "person", "userTypes", "sessions"];

/// Build the model for `collection` from its current SchemaRecord.
///
/// Any model previously built under that name is discarded first, so schema
/// edits show up on the next call. `Ok(None)` means the collection has no
/// usable model: no record, unparseable definition or indices, or a failed
/// storage call. A field type outside the vocabulary is an error.
pub async fn get_model(conn: &DatabaseHandle, collection: &str) -> Result<Option<Arc<ModelHandle>>, SchemaError> {
    if conn.discard_model(collection).is_some() {
        debug!("Discarded model {}.{}", conn.name(), collection);
    }

    let record = match get_definition(conn, collection).await {
        Ok(Some(record)) => record,
        Ok(None) => return Ok(None),
        Err(e) => {
            error!("Failed to read schema for {}.{}: {}", conn.name(), collection, e);
            return Ok(None);
        }
    };

    let Some(fields) = compile_str(&record.definition)? else {
        return Ok(None);
    };
    let indices = match record.index_definitions() {
        Ok(indices) => indices,
        Err(e) => {
            warn!("Unparseable indices for {}.{}: {}", conn.name(), collection, e);
            return Ok(None);
        }
    };

    let mut model = Arc::new(ModelHandle::new(collection, conn.name(), fields, conn.driver().clone()));

    // Sequential: each application reads the applied set the previous one wrote
    for index in &indices {
        model = match apply_index(conn, model, collection, index).await {
            Some(model) => model,
            None => {
                error!("Model {}.{} unusable after index {} failed", conn.name(), collection, index.name);
                return Ok(None);
            }
        };
    }

    conn.register_model(model.clone());
    debug!("Built model {}.{} ({} fields)", conn.name(), collection, model.fields().len());
    Ok(Some(model))
}

/// `get_model` for collections open to generic CRUD; protected system
/// collections have no public model.
pub async fn get_public_model(conn: &DatabaseHandle, collection: &str) -> Result<Option<Arc<ModelHandle>>, SchemaError> {
    if PROTECTED_COLLECTIONS.contains(&collection) {
        debug!("Refusing public model for protected collection {}", collection);
        return Ok(None);
    }
    get_model(conn, collection).await
}

/// Models for every name, in order. Fails if any has no model.
pub async fn resolve_models(conn: &DatabaseHandle, names: &[&str]) -> Result<Vec<Arc<ModelHandle>>, RegistryError> {
    let mut models = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        match get_model(conn, name).await? {
            Some(model) => models.push(model),
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(RegistryError::MissingModels(missing));
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::driver::{filter_of, DocumentDriver};
    use crate::schema::{set_definition, IndexDefinition, TypeDescriptor, SCHEMAS_COLLECTION};
    use crate::testing::{TestContext, TEST_URI};
    use serde_json::json;

    #[tokio::test]
    async fn missing_schema_is_none() {
        let ctx = TestContext::with_database("acme").await;

        assert!(get_model(&ctx.handle, "ghosts").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_type_propagates() {
        let ctx = TestContext::with_database("acme").await;
        let record = filter_of([("name", "broken"), ("definition", r#"{"field":"UnknownType"}"#), ("indices", "[]")]);
        ctx.handle
            .driver()
            .insert_one("acme", SCHEMAS_COLLECTION, record)
            .await
            .unwrap();

        let err = get_model(&ctx.handle, "broken").await.unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType(name) if name == "UnknownType"));
    }

    #[tokio::test]
    async fn unparseable_definition_is_none() {
        let ctx = TestContext::with_database("acme").await;
        let record = filter_of([("name", "broken"), ("definition", "{not json"), ("indices", "[]")]);
        ctx.handle
            .driver()
            .insert_one("acme", SCHEMAS_COLLECTION, record)
            .await
            .unwrap();

        assert!(get_model(&ctx.handle, "broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rebuilds_after_schema_change() {
        let ctx = TestContext::with_database("acme").await;
        set_definition(&ctx.handle, "widgets", &json!({ "sku": "String" }), &[]).await.unwrap();
        let first = get_model(&ctx.handle, "widgets").await.unwrap().unwrap();

        set_definition(&ctx.handle, "widgets", &json!({ "sku": "Number", "tags": { "type": "Array", "items": "String" } }), &[])
            .await
            .unwrap();
        let second = get_model(&ctx.handle, "widgets").await.unwrap().unwrap();

        assert_eq!(first.field("sku").unwrap().kind, TypeDescriptor::String);
        assert_eq!(second.field("sku").unwrap().kind, TypeDescriptor::Number);
        assert!(second.field("tags").is_some());
        assert!(Arc::ptr_eq(&ctx.handle.model("widgets").unwrap(), &second));
    }

    #[tokio::test]
    async fn indices_apply_once_per_connection() {
        let ctx = TestContext::with_database("acme").await;
        let index = IndexDefinition::new("sku", filter_of([("sku", 1)]));
        set_definition(&ctx.handle, "widgets", &json!({ "sku": "String" }), &[index]).await.unwrap();

        get_model(&ctx.handle, "widgets").await.unwrap().unwrap();
        get_model(&ctx.handle, "widgets").await.unwrap().unwrap();

        assert_eq!(ctx.connector.index_calls(TEST_URI), 1);
        assert_eq!(ctx.connector.index_names(TEST_URI, "acme", "widgets"), vec!["sku"]);
    }

    #[tokio::test]
    async fn failed_index_leaves_no_model() {
        let ctx = TestContext::with_database("acme").await;
        let index = IndexDefinition::new("sku_1", filter_of([("sku", 1)]));
        set_definition(&ctx.handle, "widgets", &json!({ "sku": "String" }), &[index]).await.unwrap();
        ctx.connector.set_rejecting_indexes(TEST_URI, true);

        assert!(get_model(&ctx.handle, "widgets").await.unwrap().is_none());
        assert!(ctx.handle.model("widgets").is_none());
        assert!(ctx.handle.applied_indices().is_empty());
        assert_eq!(ctx.connector.index_calls(TEST_URI), 1);

        // Recovers once the server accepts the index again
        ctx.connector.set_rejecting_indexes(TEST_URI, false);
        let model = get_model(&ctx.handle, "widgets").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&ctx.handle.model("widgets").unwrap(), &model));
        assert_eq!(ctx.handle.applied_indices(), vec!["widgets.sku_1".to_string()]);
    }

    #[tokio::test]
    async fn protected_collections_have_no_public_model() {
        let ctx = TestContext::with_database("acme").await;
        set_definition(&ctx.handle, "users", &json!({ "email": "String" }), &[]).await.unwrap();

        assert!(get_model(&ctx.handle, "users").await.unwrap().is_some());
        assert!(get_public_model(&ctx.handle, "users").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolve_reports_every_missing_name() {
        let ctx = TestContext::with_database("acme").await;
        set_definition(&ctx.handle, "widgets", &json!({}), &[]).await.unwrap();

        let err = resolve_models(&ctx.handle, &["widgets", "gadgets", "gizmos"]).await.unwrap_err();
        assert_eq!(err.to_string(), "Some models are missing: gadgets, gizmos");

        let models = resolve_models(&ctx.handle, &["widgets"]).await.unwrap();
        assert_eq!(models[0].name(), "widgets");
    }
}
