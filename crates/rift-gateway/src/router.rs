use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::SharedState;

/// Build the application router with all routes.
pub fn build_router(state: SharedState) -> Router {
    let cors_allow_any = state.config.gateway.cors_allow_any;

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(api::chat))
        .route("/api/tools", get(api::list_tools))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn health() -> &'static str {
    "ok"
}
