use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::database::ConnectionRegistry;
use crate::handlers::{elevated, protected, public};
use crate::middleware::cors_layer;
use crate::services::{initialize_database, DomainRegistry, Route, TenantService};

/// Shared services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
    pub domains: Arc<DomainRegistry>,
    pub tenants: Arc<TenantService>,
}

impl AppState {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        let domains = Arc::new(DomainRegistry::new(registry.clone()));
        let tenants = Arc::new(TenantService::new(domains.clone()));
        Self {
            registry,
            domains,
            tenants,
        }
    }

    /// Make sure the admin and test databases exist on the default server.
    /// Failures are logged; the server starts regardless.
    pub async fn bootstrap(&self) {
        let config = self.registry.config();
        let route = Route::default_for(config);

        for name in [config.admin_database.as_str(), config.test_database.as_str()] {
            match initialize_database(&self.domains, &route, name, true).await {
                Ok(report) => tracing::info!("{}: {}", report.database, report.message),
                Err(e) => tracing::error!("Startup bootstrap of {} failed: {}", name, e),
            }
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = routes(state.clone()).layer(cors_layer(&config.security, state.domains.clone()));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Routes without the CORS or trace layers
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(describe_routes())
        .merge(data_routes())
        .merge(root_routes())
        .with_state(state)
}

fn describe_routes() -> Router<AppState> {
    use protected::describe;

    Router::new()
        .route("/api/:region/:env/:db/describe", get(describe::collection_list))
        .route(
            "/api/:region/:env/:db/describe/:model",
            get(describe::model_get)
                .post(describe::collection_post)
                .put(describe::collection_put)
                .patch(describe::collection_rename)
                .delete(describe::collection_delete),
        )
}

fn data_routes() -> Router<AppState> {
    use protected::data;

    Router::new().route(
        "/api/:region/:env/:db/data/:model",
        get(data::records_get).post(data::records_post).delete(data::records_delete),
    )
}

fn root_routes() -> Router<AppState> {
    use elevated::databases;

    Router::new()
        .route("/api/:region/:env/root/databases", post(databases::database_create))
        .route(
            "/api/:region/:env/root/databases/:name",
            axum::routing::delete(databases::database_delete).patch(databases::database_rename),
        )
}

