use axum::extract::{Json, Path, Query, State};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::tenant_handle;
use crate::app::AppState;
use crate::database::driver::Document;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::model::{get_public_model, ModelHandle};

async fn public_model(
    state: &AppState,
    (region, env, db, model): &(String, String, String, String),
) -> Result<Arc<ModelHandle>, ApiError> {
    let conn = tenant_handle(state, region, env, db).await?;
    get_public_model(&conn, model)
        .await?
        .ok_or_else(|| ApiError::not_found("Model not found"))
}

/// Query-string pairs as an equality filter
fn query_filter(query: HashMap<String, String>) -> Document {
    query.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

/// GET /api/:region/:env/:db/data/:model?field=value
pub async fn records_get(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Document>> {
    let model = public_model(&state, &path).await?;
    let records = model.find(&query_filter(query)).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/:region/:env/:db/data/:model - one object or an array of objects
pub async fn records_post(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let model = public_model(&state, &path).await?;

    let ids = match payload {
        Value::Object(doc) => vec![model.insert_one(&doc).await?],
        Value::Array(items) => {
            let docs = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(doc) => Ok(doc),
                    _ => Err(ApiError::bad_request("Expected an array of objects")),
                })
                .collect::<Result<Vec<_>, _>>()?;
            model.insert_many(&docs).await?
        }
        _ => return Err(ApiError::bad_request("Expected an object or an array of objects")),
    };

    Ok(ApiResponse::created(json!({ "ids": ids })))
}

/// DELETE /api/:region/:env/:db/data/:model?field=value
pub async fn records_delete(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let filter = query_filter(query);
    if filter.is_empty() {
        return Err(ApiError::bad_request("Refusing to delete without a filter"));
    }

    let model = public_model(&state, &path).await?;
    let deleted = model.delete_many(&filter).await?;
    Ok(ApiResponse::success(json!({ "deleted": deleted })))
}
