//! Protected welcome endpoint

use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Welcome message for authenticated callers
#[utoipa::path(
    get,
    path = "/protected",
    tag = "home",
    responses(
        (status = 200, description = "Authenticated", body = WelcomeResponse),
        (status = 401, description = "Missing, invalid, expired, or revoked token", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn protected_handler() -> impl IntoResponse {
    Json(WelcomeResponse {
        message: "Welcome to Study Buddy Application".to_string(),
    })
}
