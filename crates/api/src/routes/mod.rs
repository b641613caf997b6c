//! HTTP routes

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    auth::middleware::{require_admin, require_auth},
    error::not_found,
    security::security_headers_middleware,
    state::AppState,
};

/// Request bodies are small JSON forms
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/api/check_username", post(auth::check_availability))
        .route("/api/check_email", post(auth::check_availability));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/profile", get(users::profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin routes (session with admin role required)
    let admin_routes = Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(health_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
