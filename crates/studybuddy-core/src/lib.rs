//! Study Buddy Core - Domain records, configuration, and shared errors
//!
//! This crate defines what the authentication server persists and
//! how it is configured:
//! - Account records and their public projection
//! - Denylist entries for revoked tokens
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for storage and configuration
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// Accounts
// ============================================================================

/// Canonical form of an email address for storage and lookup
///
/// Emails are unique case-insensitively, so every read and write goes
/// through this.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A registered user identity
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Stable unique identifier
    pub id: Uuid,

    /// Normalized email address
    pub email: String,

    /// Argon2 PHC string, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account record with a fresh identifier
    pub fn new(email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection used in API responses
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// The `{id, email}` pair returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
}

// ============================================================================
// Denylist
// ============================================================================

/// A revoked token identifier and the instant the token would have expired
///
/// `exp` is kept so expired entries can be pruned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DenylistEntry {
    pub jti: String,
    pub exp: DateTime<Utc>,
}

impl DenylistEntry {
    pub fn new(jti: impl Into<String>, exp: DateTime<Utc>) -> Self {
        Self {
            jti: jti.into(),
            exp,
        }
    }

    /// Whether the underlying token has expired by `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now
    }
}
