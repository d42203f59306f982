// handlers/public - endpoints that touch no tenant database

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Docbase API",
            "version": version,
            "description": "Multi-tenant document backend with schema-driven models",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "describe": "/api/:region/:env/:db/describe[/:model]",
                "data": "/api/:region/:env/:db/data/:model",
                "root": "/api/:region/:env/root/databases[/:name]",
            }
        }
    }))
}

/// Reports whether the default database server answers
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.registry.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
