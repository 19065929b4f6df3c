/// Authentication middleware for protecting routes
///
/// Extracts the bearer token, verifies signature and expiry, consults the
/// denylist, and resolves the account. On success the
/// [`AuthenticatedAccount`] is added to request extensions.
use super::jwt::{Claims, TokenDecoder};
use super::repository::{CredentialStore, DenylistStore};
use crate::audit::{audit_log, AuditEvent, RequestContext};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use studybuddy_core::{Account, AuthConfig, CoreError};
use thiserror::Error;

/// The identity established for one request
///
/// Extract in handlers with `Extension<AuthenticatedAccount>`. The verified
/// claims travel with it so logout never re-parses the token.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account: Account,
    pub claims: Claims,
}

/// Authentication errors
///
/// Signature, structure, and expiry failures all surface as
/// `InvalidOrExpired` so callers learn nothing about which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication store unavailable: {0}")]
    Store(#[from] CoreError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken
            | AuthError::InvalidOrExpired
            | AuthError::Revoked
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Store(ref e) => {
                tracing::error!(error = %e, "authentication store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AuthError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = serde_json::json!({ "error": message });

        (status, axum::Json(body)).into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
///
/// Returns the last whitespace-separated segment, or `None` when the
/// header is absent, not valid UTF-8, or blank. A bare `Bearer` yields
/// `"Bearer"` itself, which then fails decoding.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.split_whitespace().last()
}

/// Per-request token verification
#[derive(Clone)]
pub struct TokenVerifier {
    decoder: TokenDecoder,
    denylist: Arc<dyn DenylistStore>,
    credentials: Arc<dyn CredentialStore>,
}

impl TokenVerifier {
    pub fn new(
        config: &AuthConfig,
        denylist: Arc<dyn DenylistStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            decoder: TokenDecoder::new(config),
            denylist,
            credentials,
        }
    }

    /// Verify a presented token and resolve its account
    ///
    /// Checks run in a fixed order: presence, signature and expiry,
    /// revocation, then account lookup. A revoked token for a live account
    /// reports `Revoked`.
    pub async fn verify(&self, raw_token: Option<&str>) -> Result<AuthenticatedAccount, AuthError> {
        let token = raw_token.ok_or(AuthError::MissingToken)?;

        let claims = self.decoder.decode(token).map_err(|e| {
            tracing::debug!(reason = %e, "token failed verification");
            AuthError::InvalidOrExpired
        })?;

        if self.denylist.contains(&claims.jti).await? {
            return Err(AuthError::Revoked);
        }

        let account = self
            .credentials
            .find_by_id(claims.id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(account_id = %claims.id, "token refers to a missing account");
                AuthError::InvalidOrExpired
            })?;

        Ok(AuthenticatedAccount { account, claims })
    }
}

/// Authentication middleware that requires a valid token
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use studybuddy_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let result = state
        .verifier
        .verify(extract_bearer_token(request.headers()))
        .await;

    match result {
        Ok(authenticated) => {
            request.extensions_mut().insert(authenticated);
            Ok(next.run(request).await)
        }
        Err(err) => {
            let ctx = RequestContext::from_headers(request.headers());
            match &err {
                AuthError::InvalidOrExpired => audit_log(&AuditEvent::InvalidToken {
                    ip_address: ctx.ip_address,
                    user_agent: ctx.user_agent,
                    reason: err.to_string(),
                }),
                AuthError::Revoked => audit_log(&AuditEvent::RevokedToken {
                    ip_address: ctx.ip_address,
                    user_agent: ctx.user_agent,
                }),
                _ => {}
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenIssuer;
    use crate::auth::memory::{InMemoryCredentialStore, InMemoryDenylistStore};
    use crate::auth::password::PasswordConfig;
    use crate::auth::validation::NewAccount;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use studybuddy_core::DenylistEntry;

    struct Fixture {
        config: AuthConfig,
        credentials: Arc<InMemoryCredentialStore>,
        denylist: Arc<InMemoryDenylistStore>,
        verifier: TokenVerifier,
        issuer: TokenIssuer,
    }

    fn fixture() -> Fixture {
        let config = AuthConfig::default();
        let credentials = Arc::new(InMemoryCredentialStore::new(
            PasswordConfig::fast_for_tests(),
        ));
        let denylist = Arc::new(InMemoryDenylistStore::new());
        let verifier = TokenVerifier::new(&config, denylist.clone(), credentials.clone());
        let issuer = TokenIssuer::new(&config);
        Fixture {
            config,
            credentials,
            denylist,
            verifier,
            issuer,
        }
    }

    async fn account(fx: &Fixture) -> Account {
        fx.credentials
            .create(NewAccount::new("a@x.com", "secret1", None))
            .await
            .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
        assert_eq!(extract_bearer_token(&headers_with("")), None);
        assert_eq!(extract_bearer_token(&headers_with("   ")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer")), Some("Bearer"));
        assert_eq!(extract_bearer_token(&headers_with("Bearer ")), Some("Bearer"));
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(
            extract_bearer_token(&headers_with("bearer   abc.def.ghi ")),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_bearer_token(&headers_with("abc")), Some("abc"));
    }

    #[tokio::test]
    async fn test_verify_missing_token() {
        let fx = fixture();
        assert!(matches!(
            fx.verifier.verify(None).await,
            Err(AuthError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let fx = fixture();
        let account = account(&fx).await;
        let issued = fx.issuer.issue(&account).unwrap();

        let authenticated = fx.verifier.verify(Some(&issued.token)).await.unwrap();
        assert_eq!(authenticated.account.id, account.id);
        assert_eq!(authenticated.claims, issued.claims);
    }

    #[tokio::test]
    async fn test_verify_garbage_token() {
        let fx = fixture();
        assert!(matches!(
            fx.verifier.verify(Some("invalid_token")).await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_verify_expired_token() {
        let fx = fixture();
        let account = account(&fx).await;

        let now = Utc::now().timestamp();
        let live = fx.issuer.issue_with_expiry(&account, now + 5).unwrap();
        assert!(fx.verifier.verify(Some(&live.token)).await.is_ok());

        let expired = fx.issuer.issue_with_expiry(&account, now - 5).unwrap();
        assert!(matches!(
            fx.verifier.verify(Some(&expired.token)).await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_verify_wrong_secret() {
        let fx = fixture();
        let account = account(&fx).await;
        let other = TokenIssuer::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..fx.config.clone()
        });
        let forged = other.issue(&account).unwrap();

        assert!(matches!(
            fx.verifier.verify(Some(&forged.token)).await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_verify_revoked_token() {
        let fx = fixture();
        let account = account(&fx).await;
        let issued = fx.issuer.issue(&account).unwrap();

        fx.denylist
            .insert(DenylistEntry::new(
                &issued.claims.jti,
                Utc::now() + Duration::days(1),
            ))
            .await
            .unwrap();

        for _ in 0..3 {
            assert!(matches!(
                fx.verifier.verify(Some(&issued.token)).await,
                Err(AuthError::Revoked)
            ));
        }
    }

    #[tokio::test]
    async fn test_revoked_check_precedes_account_lookup() {
        let fx = fixture();
        let account = account(&fx).await;
        let issued = fx.issuer.issue(&account).unwrap();

        fx.denylist
            .insert(DenylistEntry::new(&issued.claims.jti, Utc::now()))
            .await
            .unwrap();
        fx.credentials.remove(account.id).await;

        assert!(matches!(
            fx.verifier.verify(Some(&issued.token)).await,
            Err(AuthError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_expired_and_revoked_reports_invalid() {
        // Signature and expiry are checked before the denylist
        let fx = fixture();
        let account = account(&fx).await;
        let issued = fx
            .issuer
            .issue_with_expiry(&account, Utc::now().timestamp() - 60)
            .unwrap();

        fx.denylist
            .insert(DenylistEntry::new(&issued.claims.jti, Utc::now()))
            .await
            .unwrap();

        assert!(matches!(
            fx.verifier.verify(Some(&issued.token)).await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_verify_deleted_account() {
        let fx = fixture();
        let account = account(&fx).await;
        let issued = fx.issuer.issue(&account).unwrap();
        fx.credentials.remove(account.id).await;

        assert!(matches!(
            fx.verifier.verify(Some(&issued.token)).await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_auth_error_responses() {
        let cases = [
            (AuthError::MissingToken, "Missing authentication token"),
            (AuthError::InvalidOrExpired, "Invalid or expired token"),
            (AuthError::Revoked, "Token has been revoked"),
            (AuthError::InvalidCredentials, "Invalid email or password"),
        ];

        for (err, message) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json, serde_json::json!({ "error": message }));
        }
    }

    #[tokio::test]
    async fn test_store_error_is_internal() {
        let response =
            AuthError::Store(CoreError::Database("connection refused".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("connection refused"));
    }
}
