//! papshop-mock-api: local stand-in for the shop REST API
//!
//! Serves just the endpoints the admin console consumes:
//! - Login issuing scope-carrying JWTs, and logout revoking them
//! - Admin listings and deletes over in-memory sample data
//! - 401 for missing or invalid tokens, 403 for non-admin roles

pub mod auth;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use auth::JwtIssuer;
pub use handlers::SharedState;
pub use state::MockState;

/// Build the router, with every endpoint under `/api`
pub fn router(state: MockState) -> Router {
    let state: SharedState = Arc::new(RwLock::new(state));

    let api = Router::new()
        .route("/user/login", post(handlers::login_handler))
        .route("/user/logout", post(handlers::logout_handler))
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route("/products", get(handlers::list_products))
        .route("/products/{id}", delete(handlers::delete_product))
        .route("/category", get(handlers::list_categories))
        .route("/category/{id}", delete(handlers::delete_category))
        .route("/orders/admin/all", get(handlers::list_orders))
        .route("/user", get(handlers::list_users))
        .route("/user/admin/{id}", delete(handlers::delete_user))
        .route("/announcements", get(handlers::list_announcements))
        .route("/announcements/{id}", delete(handlers::delete_announcement));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
