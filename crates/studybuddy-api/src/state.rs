//! Application state management

use crate::auth::jwt::TokenIssuer;
use crate::auth::middleware::TokenVerifier;
use crate::auth::repository::{CredentialStore, DenylistStore};
use crate::auth::service::AuthService;
use std::sync::Arc;
use std::time::Instant;
use studybuddy_core::config::AppConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Signup, login, logout, and identity queries
    pub auth_service: AuthService,
    /// Per-request token verification
    pub verifier: TokenVerifier,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Wire the auth components around the given stores
    ///
    /// The signing secret is read from `config` once here and handed to
    /// both the issuer and the verifier.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        denylist: Arc<dyn DenylistStore>,
    ) -> Self {
        let issuer = TokenIssuer::new(&config.auth);
        let verifier = TokenVerifier::new(&config.auth, denylist.clone(), credentials.clone());
        let auth_service = AuthService::new(credentials, denylist, issuer);

        Self {
            config,
            auth_service,
            verifier,
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl AppState {
    /// State over in-memory stores with light password hashing
    pub fn for_testing() -> Self {
        use crate::auth::memory::{InMemoryCredentialStore, InMemoryDenylistStore};
        use crate::auth::password::PasswordConfig;

        Self::new(
            AppConfig::default(),
            Arc::new(InMemoryCredentialStore::new(PasswordConfig::fast_for_tests())),
            Arc::new(InMemoryDenylistStore::new()),
        )
    }
}
