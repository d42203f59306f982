use axum::extract::{Json, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Route, TenantInfo};

/**
 * POST /api/:region/:env/root/databases - create and seed a tenant database
 *
 * Expected Input:
 * ```json
 * {
 *   "name": "acme",                        // Required: database name
 *   "domains": ["https://app.acme.com"]    // Optional: allowed CORS origins
 * }
 * ```
 */
#[derive(Debug, Deserialize)]
pub struct CreateDatabaseRequest {
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameDatabaseRequest {
    pub name: String,
}

pub async fn database_create(
    State(state): State<AppState>,
    Path((region, env)): Path<(String, String)>,
    Json(payload): Json<CreateDatabaseRequest>,
) -> ApiResult<TenantInfo> {
    let route = Route::new(region, env);
    let info = state
        .tenants
        .create_tenant(&route, &payload.name, &payload.domains)
        .await?;
    Ok(ApiResponse::created(info))
}

/// DELETE /api/:region/:env/root/databases/:name
pub async fn database_delete(
    State(state): State<AppState>,
    Path((region, env, name)): Path<(String, String, String)>,
) -> ApiResult<Value> {
    let route = Route::new(region, env);
    state.tenants.drop_tenant(&route, &name).await?;
    Ok(ApiResponse::success(json!({ "deleted": true, "name": name })))
}

/// PATCH /api/:region/:env/root/databases/:name - body `{ "name": "<target>" }`
pub async fn database_rename(
    State(state): State<AppState>,
    Path((region, env, name)): Path<(String, String, String)>,
    Json(payload): Json<RenameDatabaseRequest>,
) -> ApiResult<Value> {
    let route = Route::new(region, env);
    state.tenants.rename_tenant(&route, &name, &payload.name).await?;
    Ok(ApiResponse::success(json!({ "renamed": true, "from": name, "to": payload.name })))
}
