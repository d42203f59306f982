mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode as AxumStatus};
use common::{spawn_server, Harness};
use docbase_api::app::app;
use docbase_api::config::{ApiConfig, AppConfig, DatabaseConfig, Environment, SecurityConfig};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let harness = Harness::new();
    let server = spawn_server(harness.state()).await?;

    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn tenant_lifecycle_over_http() -> Result<()> {
    let harness = Harness::new();
    let state = harness.state();
    state.bootstrap().await;
    let server = spawn_server(state).await?;
    let client = reqwest::Client::new();
    let base = format!("{}/api/asia/development", server.base_url);

    let res = client
        .post(format!("{}/root/databases", base))
        .json(&json!({ "name": "acme", "domains": ["https://acme.example"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "create failed: {}", res.text().await?);

    let res = client.get(format!("{}/acme/describe/users", base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["fields"]["createdAt"], json!("Date"));

    let res = client.get(format!("{}/acme/describe/ghosts", base)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "Model not found");

    let res = client
        .post(format!("{}/root/databases", base))
        .json(&json!({ "name": "acme" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // `root` would be shadowed by the database management routes
    let res = client
        .post(format!("{}/root/databases", base))
        .json(&json!({ "name": "root" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.delete(format!("{}/root/databases/acme", base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(format!("{}/acme/describe/users", base)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["message"], "Database 'acme' does not exist.");
    Ok(())
}

#[tokio::test]
async fn collections_and_records_over_http() -> Result<()> {
    let harness = Harness::new();
    let state = harness.state();
    state.bootstrap().await;
    let server = spawn_server(state).await?;
    let client = reqwest::Client::new();
    let base = format!("{}/api/asia/development/test", server.base_url);

    let res = client
        .post(format!("{}/describe/widgets", base))
        .json(&json!({
            "definition": { "sku": { "type": "String", "required": true }, "price": "Number" },
            "indices": [{ "name": "sku_1", "keys": { "sku": 1 }, "options": { "unique": true } }]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/data/widgets", base))
        .json(&json!([{ "sku": "a", "price": 1 }, { "sku": "b", "price": 2 }]))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client.post(format!("{}/data/widgets", base)).json(&json!({ "price": 3 })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["field_errors"]["sku"], "This field is required");

    let res = client.get(format!("{}/data/widgets?sku=b", base)).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["price"], 2);

    let res = client.get(format!("{}/describe/widgets", base)).send().await?;
    assert_eq!(res.json::<Value>().await?["data"]["indices"], json!(["sku_1"]));

    // System collections are not reachable through the generic data routes
    let res = client.get(format!("{}/data/users", base)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(format!("{}/describe/schemas", base)).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.delete(format!("{}/describe/widgets", base)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(format!("{}/describe/widgets", base)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

fn config_with_cors(origins: &[&str]) -> AppConfig {
    AppConfig {
        environment: Environment::Development,
        database: DatabaseConfig::with_uris([(common::REGION, common::ENV, common::URI)]),
        api: ApiConfig {
            port: 0,
            enable_request_logging: false,
        },
        security: SecurityConfig {
            enable_cors: true,
            cors_origins: origins.iter().map(|s| s.to_string()).collect(),
        },
    }
}

async fn preflight_allows(router: axum::Router, origin: &str) -> Result<bool> {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/health")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())?;
    let response = router.oneshot(request).await?;

    assert_eq!(response.status(), AxumStatus::OK);
    Ok(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some())
}

#[tokio::test]
async fn cors_follows_static_and_tenant_domains() -> Result<()> {
    let harness = Harness::new();
    let state = harness.state();
    state.bootstrap().await;
    let config = config_with_cors(&["https://console.example"]);

    assert!(preflight_allows(app(state.clone(), &config), "https://console.example").await?);
    assert!(preflight_allows(app(state.clone(), &config), "http://localhost:3001").await?);
    assert!(!preflight_allows(app(state.clone(), &config), "https://acme.example").await?);

    state
        .tenants
        .create_tenant(&harness.route(), "acme", &["https://acme.example".to_string()])
        .await?;

    assert!(preflight_allows(app(state, &config), "https://acme.example").await?);
    Ok(())
}
