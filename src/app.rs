//! Application composition: common routes, one router per entity under the API prefix,
//! and the HTTP middleware stack.

use crate::config::HttpSettings;
use crate::openapi;
use crate::permission::PermissionRegistry;
use crate::routes::{common_routes, entity_routes};
use crate::state::AppState;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the complete router. Entities missing from `permissions` allow every request.
pub fn build_app(state: AppState, permissions: &PermissionRegistry, http: &HttpSettings) -> Router {
    let doc = openapi::build(&state.model, &http.api_prefix);
    let entities = entity_routes(&state, permissions);
    let api = if http.api_prefix.is_empty() {
        entities
    } else {
        Router::new().nest(&http.api_prefix, entities)
    };
    tracing::info!(
        entities = state.model.entities.len(),
        prefix = %http.api_prefix,
        "entity routers mounted"
    );

    Router::new()
        .merge(common_routes(state, doc))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(http.body_limit_bytes))
        .layer(cors_layer(&http.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// `*` (or no usable origin) allows any origin; otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let list: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if list.is_empty() || origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(list)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
