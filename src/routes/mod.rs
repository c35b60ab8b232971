pub mod api;

pub use api::create_api_routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Config, docs::ApiDoc, handlers::health_check, state::AppState, websocket::websocket_handler};

/// Assemble the full application router
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.max_body_size;

    Router::new()
        // Mount API routes
        .nest("/api", create_api_routes())
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .with_state(state)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origins) = config.cors_origin_list() else {
        return CorsLayer::permissive();
    };
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
}
