// handlers/protected - per-tenant endpoints under /api/:region/:env/:db/*
//
// Each handler connects to the addressed tenant database through the shared
// ConnectionRegistry; a missing database surfaces as 404.

pub mod data;
pub mod describe;

use std::sync::Arc;

use crate::app::AppState;
use crate::database::DatabaseHandle;
use crate::error::ApiError;

pub(crate) async fn tenant_handle(
    state: &AppState,
    region: &str,
    env: &str,
    db: &str,
) -> Result<Arc<DatabaseHandle>, ApiError> {
    Ok(state.registry.connect(region, env, db).await?)
}
