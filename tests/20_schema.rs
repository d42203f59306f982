mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{Harness, ENV, REGION, URI};
use docbase_api::database::driver::{filter_of, Document, DocumentDriver};
use docbase_api::model::{get_model, ModelHandle};
use docbase_api::schema::types::serialize_descriptor_map;
use docbase_api::schema::{
    apply_index, compile_str, set_definition, DescriptorMap, FieldDescriptor, IndexDefinition, SchemaError,
    TypeDescriptor, SCHEMAS_COLLECTION,
};
use serde_json::{json, Value};

fn every_kind() -> DescriptorMap {
    let mut map = DescriptorMap::new();
    map.insert("title".into(), FieldDescriptor::new(TypeDescriptor::String).required());
    map.insert("price".into(), FieldDescriptor::new(TypeDescriptor::Number));
    map.insert("active".into(), FieldDescriptor::new(TypeDescriptor::Boolean).with_default(json!(true)));
    map.insert("publishedAt".into(), FieldDescriptor::new(TypeDescriptor::Date));
    map.insert(
        "tags".into(),
        FieldDescriptor::new(TypeDescriptor::Array(Box::new(FieldDescriptor::new(TypeDescriptor::String)))),
    );
    map.insert(
        "owners".into(),
        FieldDescriptor::new(TypeDescriptor::Array(Box::new(
            FieldDescriptor::new(TypeDescriptor::ObjectId).with_ref("users"),
        ))),
    );
    map.insert("meta".into(), FieldDescriptor::new(TypeDescriptor::Object));
    map.insert("extra".into(), FieldDescriptor::new(TypeDescriptor::Mixed));
    map.insert("owner".into(), FieldDescriptor::new(TypeDescriptor::ObjectId).with_ref("users"));
    map.insert("parent".into(), FieldDescriptor::new(TypeDescriptor::ObjectId));
    map.insert("avatar".into(), FieldDescriptor::new(TypeDescriptor::Buffer));
    map.insert("labels".into(), FieldDescriptor::new(TypeDescriptor::Map).unique());
    map
}

#[test]
fn compile_inverts_serialize_for_every_kind() -> Result<()> {
    let map = every_kind();

    let compiled = compile_str(&serialize_descriptor_map(&map))?.expect("object definition compiles");

    assert_eq!(compiled, map);
    Ok(())
}

#[tokio::test]
async fn apply_index_issues_one_storage_call() -> Result<()> {
    let harness = Harness::new();
    harness.create_database("acme").await?;
    let conn = harness.registry.connect(REGION, ENV, "acme").await?;
    let model = Arc::new(ModelHandle::new("widgets", "acme", every_kind(), conn.driver().clone()));
    let index = IndexDefinition::new("title_1", filter_of([("title", 1)]));

    let first = apply_index(&conn, model.clone(), "widgets", &index).await.expect("index applies");
    let second = apply_index(&conn, first.clone(), "widgets", &index).await.expect("second call is a no-op");

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&model, &second));
    assert_eq!(harness.connector.index_calls(URI), 1);
    assert_eq!(conn.applied_indices(), vec!["widgets.title_1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn incomplete_indices_are_skipped_but_empty_options_apply() -> Result<()> {
    let harness = Harness::new();
    harness.create_database("acme").await?;
    let conn = harness.registry.connect(REGION, ENV, "acme").await?;
    let model = Arc::new(ModelHandle::new("widgets", "acme", DescriptorMap::new(), conn.driver().clone()));

    let nameless = IndexDefinition::new("", filter_of([("title", 1)]));
    let keyless = IndexDefinition::new("title_1", Document::new());
    assert!(apply_index(&conn, model.clone(), "widgets", &nameless).await.is_some());
    assert!(apply_index(&conn, model.clone(), "widgets", &keyless).await.is_some());
    assert!(apply_index(&conn, model.clone(), "", &keyless).await.is_some());
    assert_eq!(harness.connector.index_calls(URI), 0);

    let plain = IndexDefinition::new("title_1", filter_of([("title", 1)]));
    assert!(apply_index(&conn, model, "widgets", &plain).await.is_some());
    assert_eq!(harness.connector.index_calls(URI), 1);
    Ok(())
}

#[tokio::test]
async fn model_reflects_latest_schema() -> Result<()> {
    let harness = Harness::new();
    harness.create_database("acme").await?;
    let conn = harness.registry.connect(REGION, ENV, "acme").await?;

    set_definition(&conn, "widgets", &json!({ "title": "String" }), &[]).await?;
    let h1 = get_model(&conn, "widgets").await?.expect("model for S1");
    assert!(h1.field("price").is_none());

    set_definition(&conn, "widgets", &json!({ "title": "String", "price": "Number" }), &[]).await?;
    let h2 = get_model(&conn, "widgets").await?.expect("model for S2");

    assert!(!Arc::ptr_eq(&h1, &h2));
    assert_eq!(h2.field("price").map(|f| f.kind.clone()), Some(TypeDescriptor::Number));
    Ok(())
}

#[tokio::test]
async fn collection_without_schema_has_no_model() -> Result<()> {
    let harness = Harness::new();
    harness.create_database("acme").await?;
    let conn = harness.registry.connect(REGION, ENV, "acme").await?;

    assert!(get_model(&conn, "widgets").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_type_surfaces_from_get_model() -> Result<()> {
    let harness = Harness::new();
    harness.create_database("acme").await?;
    let raw = harness.raw().await?;
    let mut record = Document::new();
    record.insert("name".into(), Value::from("widgets"));
    record.insert("definition".into(), Value::from(r#"{"field":"UnknownType"}"#));
    raw.insert_one("acme", SCHEMAS_COLLECTION, record).await?;
    let conn = harness.registry.connect(REGION, ENV, "acme").await?;

    let err = get_model(&conn, "widgets").await.unwrap_err();

    assert!(matches!(err, SchemaError::UnsupportedType(ref name) if name == "UnknownType"));
    Ok(())
}
