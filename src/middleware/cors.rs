use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::SecurityConfig;
use crate::services::DomainRegistry;

/// CORS policy over the static allow-list plus the domains derived from
/// tenant `apps` records. The derived list is read from the registry's
/// snapshot on every preflight, so tenant changes apply without a restart.
pub fn cors_layer(security: &SecurityConfig, domains: Arc<DomainRegistry>) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let static_origins = security.cors_origins.clone();
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(origin) = origin.to_str() else {
            return false;
        };
        static_origins.iter().any(|allowed| allowed == origin) || domains.is_allowed(origin)
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
