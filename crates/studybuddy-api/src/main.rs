//! Study Buddy API Server
//!
//! REST API server issuing and verifying JWT bearer tokens.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use studybuddy_api::auth::{
    InMemoryCredentialStore, InMemoryDenylistStore, PasswordConfig, PgCredentialStore,
    PgDenylistStore,
};
use studybuddy_api::auth::{CredentialStore, DenylistStore};
use studybuddy_api::{create_router, state::AppState};
use studybuddy_core::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("STUDYBUDDY_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    config.validate()?;

    // Initialize tracing; audit events have their own target
    let level = &config.logging.level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("studybuddy_api={level},tower_http={level},audit=info").into());
    if config.logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let password_config = PasswordConfig::from(&config.auth);
    let (credentials, denylist): (Arc<dyn CredentialStore>, Arc<dyn DenylistStore>) =
        match &config.database.url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.pool_size)
                    .connect(url)
                    .await?;
                tracing::info!("Connected to PostgreSQL");
                (
                    Arc::new(PgCredentialStore::new(pool.clone(), password_config)),
                    Arc::new(PgDenylistStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
                (
                    Arc::new(InMemoryCredentialStore::new(password_config)),
                    Arc::new(InMemoryDenylistStore::new()),
                )
            }
        };

    if config.auth.jwt_secret == studybuddy_core::config::DEV_JWT_SECRET {
        tracing::warn!("JWT_SECRET not set, using the development signing secret");
    }

    let addr = config.bind_address();

    // Create application state
    let state = Arc::new(AppState::new(config, credentials, denylist));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Study Buddy API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
