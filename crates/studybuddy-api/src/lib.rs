//! Study Buddy API - JWT authentication server
//!
//! Issues signed bearer tokens on signup and login, verifies them on
//! protected routes, and revokes them on logout through a denylist.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the bearer token security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Study Buddy API",
        description = "JWT authentication with denylist-based logout"
    ),
    paths(
        handlers::auth::signup_handler,
        handlers::auth::login_handler,
        handlers::auth::logout_handler,
        handlers::auth::me_handler,
        handlers::home::protected_handler,
        handlers::health::health_check,
    ),
    components(schemas(
        handlers::auth::SignupRequest,
        handlers::auth::SignupUser,
        handlers::auth::LoginRequest,
        handlers::auth::LoginUser,
        handlers::auth::UserInfo,
        handlers::auth::AuthResponse,
        handlers::auth::MeResponse,
        handlers::auth::LogoutResponse,
        handlers::home::WelcomeResponse,
        handlers::health::HealthResponse,
        error::ApiError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login, logout, and identity"),
        (name = "home", description = "Protected demonstration endpoint"),
        (name = "health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/up", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(routes::api_routes(state.clone()))
        .nest("/api/v1", routes::v1_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Empty allowlist means any origin
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        base.allow_origin(origins)
    }
}

/// Router over in-memory stores for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(AppState::for_testing()))
}

