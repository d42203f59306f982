use axum::extract::{Json, Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::tenant_handle;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::model::get_model;
use crate::schema::types::descriptor_map_to_value;
use crate::schema::IndexDefinition;
use crate::services::{CollectionInfo, DescribeService};

#[derive(Debug, Deserialize)]
pub struct DescribeRequest {
    pub definition: Value,
    #[serde(default)]
    pub indices: Vec<IndexDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// GET /api/:region/:env/:db/describe - every collection with its stored schema
pub async fn collection_list(
    State(state): State<AppState>,
    Path((region, env, db)): Path<(String, String, String)>,
) -> ApiResult<Vec<CollectionInfo>> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    let collections = DescribeService::new(conn).list().await?;
    Ok(ApiResponse::success(collections))
}

/// GET /api/:region/:env/:db/describe/:model - the compiled field table
///
/// The model is rebuilt from the current SchemaRecord, so the response always
/// reflects the latest stored definition.
pub async fn model_get(
    State(state): State<AppState>,
    Path((region, env, db, model)): Path<(String, String, String, String)>,
) -> ApiResult<Value> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    let handle = get_model(&conn, &model)
        .await?
        .ok_or_else(|| ApiError::not_found("Model not found"))?;

    let prefix = format!("{}.", model);
    let indices: Vec<String> = conn
        .applied_indices()
        .into_iter()
        .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
        .collect();

    Ok(ApiResponse::success(json!({
        "name": handle.name(),
        "database": handle.database(),
        "fields": descriptor_map_to_value(handle.fields()),
        "indices": indices,
    })))
}

/// POST /api/:region/:env/:db/describe/:model - create a collection
pub async fn collection_post(
    State(state): State<AppState>,
    Path((region, env, db, model)): Path<(String, String, String, String)>,
    Json(payload): Json<DescribeRequest>,
) -> ApiResult<CollectionInfo> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    let created = DescribeService::new(conn)
        .create_one(&model, &payload.definition, &payload.indices)
        .await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/:region/:env/:db/describe/:model - replace a collection's schema
pub async fn collection_put(
    State(state): State<AppState>,
    Path((region, env, db, model)): Path<(String, String, String, String)>,
    Json(payload): Json<DescribeRequest>,
) -> ApiResult<CollectionInfo> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    let updated = DescribeService::new(conn)
        .update_404(&model, &payload.definition, &payload.indices)
        .await?;
    Ok(ApiResponse::success(updated))
}

/// PATCH /api/:region/:env/:db/describe/:model - rename a collection
pub async fn collection_rename(
    State(state): State<AppState>,
    Path((region, env, db, model)): Path<(String, String, String, String)>,
    Json(payload): Json<RenameRequest>,
) -> ApiResult<CollectionInfo> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    let renamed = DescribeService::new(conn).rename(&model, &payload.name).await?;
    Ok(ApiResponse::success(renamed))
}

/// DELETE /api/:region/:env/:db/describe/:model - drop a collection and its schema
pub async fn collection_delete(
    State(state): State<AppState>,
    Path((region, env, db, model)): Path<(String, String, String, String)>,
) -> ApiResult<Value> {
    let conn = tenant_handle(&state, &region, &env, &db).await?;
    DescribeService::new(conn).delete_404(&model).await?;

    Ok(ApiResponse::success(json!({
        "deleted": true,
        "collection": model,
    })))
}
