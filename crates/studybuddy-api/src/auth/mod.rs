//! Authentication module
//!
//! JWT-based authentication with the following components:
//! - Token issuance and decoding (HMAC-SHA256)
//! - Password hashing with Argon2
//! - Registration field validation
//! - Credential and denylist stores (PostgreSQL and in-memory)
//! - Middleware for request authentication
//! - Authentication service for signup, login, and logout

pub mod jwt;
pub mod memory;
pub mod middleware;
pub mod password;
pub mod repository;
pub mod service;
pub mod validation;

pub use jwt::{Claims, IssuedToken, JwtError, TokenDecoder, TokenIssuer};
pub use memory::{InMemoryCredentialStore, InMemoryDenylistStore};
pub use middleware::{
    auth_middleware, extract_bearer_token, AuthError, AuthenticatedAccount, TokenVerifier,
};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use repository::{
    CreateAccountError, CredentialStore, DenylistStore, PgCredentialStore, PgDenylistStore,
};
pub use service::{AuthService, AuthSuccess};
pub use validation::{validate_new_account, NewAccount, ValidationErrors};
