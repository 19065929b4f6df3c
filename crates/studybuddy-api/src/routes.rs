//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, home};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Authentication and protected routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/logout", delete(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route("/protected", get(home::protected_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Versioned mount, with the welcome message at the prefix root
pub fn v1_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let home = Router::new()
        .route("/", get(home::protected_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    api_routes(state).merge(home)
}
