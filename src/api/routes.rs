//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_entry_handler, get_entry_handler, github_proxy_handler, health_handler,
    invalidate_handler, invalidate_repository_handler, invalidate_user_handler, portfolio_handler,
    portfolio_stats_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/stats/portfolio", get(portfolio_stats_handler))
        .route("/cache", get(get_entry_handler).delete(delete_entry_handler))
        .route("/cache/all", delete(clear_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route(
            "/cache/invalidate/repository",
            post(invalidate_repository_handler),
        )
        .route("/cache/invalidate/user", post(invalidate_user_handler))
        .route("/github/*endpoint", get(github_proxy_handler))
        .route("/portfolio/:owner/:repo", get(portfolio_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
