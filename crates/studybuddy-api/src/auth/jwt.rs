//! JWT token generation and validation
//!
//! Implements stateless bearer tokens signed with HMAC-SHA256.
//! Tokens carry exactly four claims: `id`, `email`, `jti`, and `exp`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use studybuddy_core::{Account, AuthConfig};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
///
/// `email` is a snapshot taken at issuance and may go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identifier
    pub id: Uuid,
    /// Account email at issuance
    pub email: String,
    /// JWT ID - unique per issuance, the revocation key
    pub jti: String,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

impl Claims {
    /// Expiry as an instant, `None` if `exp` is outside the representable range
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,
}

/// A freshly signed token together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Builds and signs tokens for authenticated accounts
///
/// Holds the process-wide signing key; construct once at startup.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    lifetime_secs: i64,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime_secs: i64::try_from(config.token_lifetime_secs).unwrap_or(i64::MAX),
        }
    }

    /// Token lifetime in seconds
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Sign a token for `account` expiring one lifetime from now
    ///
    /// # Example
    ///
    /// ```no_run
    /// use studybuddy_api::auth::jwt::TokenIssuer;
    /// use studybuddy_core::{Account, AuthConfig};
    ///
    /// let issuer = TokenIssuer::new(&AuthConfig::default());
    /// let account = Account::new("a@x.com", "hash".to_string());
    /// let issued = issuer.issue(&account).expect("Failed to sign token");
    /// assert_eq!(issued.token.split('.').count(), 3);
    /// ```
    pub fn issue(&self, account: &Account) -> Result<IssuedToken, JwtError> {
        let exp = Utc::now().timestamp().saturating_add(self.lifetime_secs);
        self.issue_with_expiry(account, exp)
    }

    /// Sign a token for `account` with an explicit `exp`
    pub fn issue_with_expiry(&self, account: &Account, exp: i64) -> Result<IssuedToken, JwtError> {
        let claims = Claims {
            id: account.id,
            email: account.email.clone(),
            jti: Uuid::new_v4().to_string(),
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken { token, claims })
    }
}

/// Verifies signature and expiry of presented tokens
#[derive(Clone)]
pub struct TokenDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenDecoder {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and extract its claims
    ///
    /// Never panics on malformed input; every failure is a `JwtError`.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken,
            },
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn account() -> Account {
        Account::new("test@example.com", "hash".to_string())
    }

    fn config_with_secret(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_and_decode_token() {
        let config = AuthConfig::default();
        let account = account();

        let issued = TokenIssuer::new(&config)
            .issue(&account)
            .expect("Failed to issue token");
        let claims = TokenDecoder::new(&config)
            .decode(&issued.token)
            .expect("Failed to decode token");

        assert_eq!(claims, issued.claims);
        assert_eq!(claims.id, account.id);
        assert_eq!(claims.email, "test@example.com");
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn test_token_has_three_segments() {
        let issued = TokenIssuer::new(&AuthConfig::default())
            .issue(&account())
            .unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn test_expiry_is_one_lifetime_out() {
        let config = AuthConfig::default();
        let before = Utc::now().timestamp();
        let issued = TokenIssuer::new(&config).issue(&account()).unwrap();
        let after = Utc::now().timestamp();

        assert!(issued.claims.exp >= before + 86_400);
        assert!(issued.claims.exp <= after + 86_400);
    }

    #[test]
    fn test_jti_is_fresh_per_issuance() {
        let issuer = TokenIssuer::new(&AuthConfig::default());
        let account = account();

        let first = issuer.issue(&account).unwrap();
        let second = issuer.issue(&account).unwrap();
        assert_ne!(first.claims.jti, second.claims.jti);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_wire_claims_are_exactly_four() {
        let issued = TokenIssuer::new(&AuthConfig::default())
            .issue(&account())
            .unwrap();
        let value = serde_json::to_value(&issued.claims).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "exp", "id", "jti"]);
    }

    #[test]
    fn test_invalid_token() {
        let decoder = TokenDecoder::new(&AuthConfig::default());
        assert!(matches!(
            decoder.decode("invalid.token.here"),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(decoder.decode(""), Err(JwtError::InvalidToken)));
        assert!(matches!(
            decoder.decode("invalid_token"),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let issued = TokenIssuer::new(&config_with_secret("secret1"))
            .issue(&account())
            .unwrap();

        let result = TokenDecoder::new(&config_with_secret("secret2")).decode(&issued.token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let config = AuthConfig::default();
        let exp = Utc::now().timestamp() - 3600;
        let issued = TokenIssuer::new(&config)
            .issue_with_expiry(&account(), exp)
            .unwrap();

        let result = TokenDecoder::new(&config).decode(&issued.token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_expiry_boundary_without_leeway() {
        let config = AuthConfig::default();
        let issuer = TokenIssuer::new(&config);
        let decoder = TokenDecoder::new(&config);
        let now = Utc::now().timestamp();

        let just_valid = issuer.issue_with_expiry(&account(), now + 5).unwrap();
        assert!(decoder.decode(&just_valid.token).is_ok());

        let just_expired = issuer.issue_with_expiry(&account(), now - 5).unwrap();
        assert!(matches!(
            decoder.decode(&just_expired.token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let config = AuthConfig::default();
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(TokenDecoder::new(&config).decode(&token).is_err());
    }

    #[test]
    fn test_expires_at() {
        let claims = Claims {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            jti: "jti".to_string(),
            exp: 1_700_000_000,
        };
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);

        let unrepresentable = Claims {
            exp: i64::MAX,
            ..claims
        };
        assert!(unrepresentable.expires_at().is_none());
    }

    #[test]
    fn test_issuer_debug_hides_key() {
        let issuer = TokenIssuer::new(&config_with_secret("do-not-print-me"));
        assert!(!format!("{issuer:?}").contains("do-not-print-me"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_claims_round_trip(local in "[a-z0-9._]{1,20}", domain in "[a-z]{1,10}\\.[a-z]{2,3}") {
            let config = AuthConfig::default();
            let account = Account::new(&format!("{local}@{domain}"), "hash".to_string());

            let issued = TokenIssuer::new(&config).issue(&account).unwrap();
            let claims = TokenDecoder::new(&config).decode(&issued.token).unwrap();

            prop_assert_eq!(claims.id, account.id);
            prop_assert_eq!(claims.email, account.email);
        }
    }
}
