//! Authentication service layer
//!
//! Orchestrates the credential store, token issuer, and denylist for
//! signup, login, logout, and identity queries.

use super::jwt::{IssuedToken, TokenIssuer};
use super::middleware::{AuthError, AuthenticatedAccount};
use super::password::verify_password;
use super::repository::{CredentialStore, DenylistStore};
use super::validation::NewAccount;
use crate::error::AppError;
use std::sync::Arc;
use studybuddy_core::{Account, AccountView, DenylistEntry};

/// A successful signup or login
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub account: Account,
    pub token: IssuedToken,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    denylist: Arc<dyn DenylistStore>,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        denylist: Arc<dyn DenylistStore>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            credentials,
            denylist,
            issuer,
        }
    }

    /// Register a new account and log it in
    ///
    /// # Returns
    ///
    /// * `Ok(AuthSuccess)` - Created account with a fresh token
    /// * `Err(AppError::Validation)` - Aggregated field messages; nothing persisted
    pub async fn signup(&self, new: NewAccount) -> Result<AuthSuccess, AppError> {
        let account = self.credentials.create(new).await?;
        let token = self.issuer.issue(&account)?;

        tracing::info!(account_id = %account.id, "account created");

        Ok(AuthSuccess { account, token })
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password fail with the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, AppError> {
        let account = match self.credentials.find_by_email(email).await? {
            Some(account) if self.credentials.verify_password(&account, password) => account,
            Some(_) => return Err(AuthError::InvalidCredentials.into()),
            None => {
                // Pay the same Argon2 cost as a wrong password
                let _ = verify_password(password, self.credentials.timing_hash());
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let token = self.issuer.issue(&account)?;

        Ok(AuthSuccess { account, token })
    }

    /// Revoke the token that authenticated this request
    ///
    /// An `exp` outside the representable range skips the insert and still
    /// succeeds. A denylist failure is returned, since the token stays valid.
    pub async fn logout(&self, current: &AuthenticatedAccount) -> Result<(), AppError> {
        let claims = &current.claims;

        let Some(exp) = claims.expires_at() else {
            tracing::warn!(jti = %claims.jti, exp = claims.exp, "token expiry out of range, not revoked");
            return Ok(());
        };

        self.denylist
            .insert(DenylistEntry::new(&claims.jti, exp))
            .await?;

        Ok(())
    }

    /// Public projection of the authenticated account
    pub fn who_am_i(&self, current: &AuthenticatedAccount) -> AccountView {
        current.account.view()
    }

    /// Token lifetime in seconds
    pub fn token_lifetime_secs(&self) -> i64 {
        self.issuer.lifetime_secs()
    }
}
