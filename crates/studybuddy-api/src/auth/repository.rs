//! Authentication repository for PostgreSQL
//!
//! Storage seams for the two persisted entities:
//! - `CredentialStore`: account records with case-insensitive unique email
//! - `DenylistStore`: revoked token identifiers with their original expiry
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     email TEXT NOT NULL,
//!     password_hash TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE UNIQUE INDEX users_email_lower_idx ON users (lower(email));
//!
//! CREATE TABLE jwt_denylist (
//!     jti TEXT PRIMARY KEY,
//!     exp TIMESTAMPTZ NOT NULL
//! );
//! ```

use super::password::{hash_password, verify_password, PasswordConfig};
use super::validation::{validate_new_account, NewAccount, ValidationErrors};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use studybuddy_core::{normalize_email, Account, CoreError, DenylistEntry};
use thiserror::Error;
use uuid::Uuid;

/// Account creation failures
#[derive(Debug, Error)]
pub enum CreateAccountError {
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Account persistence and password checks
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Validate and persist a new account
    ///
    /// Nothing is written when validation fails.
    async fn create(&self, new: NewAccount) -> Result<Account, CreateAccountError>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, CoreError>;

    /// A hash with this store's costs, checked when no account matches an email
    fn timing_hash(&self) -> &str;

    /// Check a plaintext password against the stored hash
    ///
    /// A corrupt stored hash counts as a mismatch.
    fn verify_password(&self, account: &Account, plaintext: &str) -> bool {
        match verify_password(plaintext, &account.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "stored password hash unusable");
                false
            }
        }
    }
}

/// Revoked token bookkeeping
#[async_trait]
pub trait DenylistStore: Send + Sync {
    /// Record a revoked token
    ///
    /// Inserting a `jti` that is already present succeeds without change.
    async fn insert(&self, entry: DenylistEntry) -> Result<(), CoreError>;

    /// Whether `jti` has been revoked, regardless of its expiry
    async fn contains(&self, jti: &str) -> Result<bool, CoreError>;

    async fn count(&self) -> Result<u64, CoreError>;

    /// Delete entries whose tokens expired by `now`, returning how many were removed
    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, CoreError>;
}

/// Run field validation and hash the password
///
/// Shared by every `CredentialStore` so all backends report identical messages.
pub(crate) fn prepare_account(
    new: &NewAccount,
    email_taken: bool,
    password_config: &PasswordConfig,
) -> Result<Account, CreateAccountError> {
    validate_new_account(new, email_taken)
        .into_result()
        .map_err(CreateAccountError::Invalid)?;

    let password_hash = hash_password(&new.password, password_config)
        .map_err(|e| CoreError::Hashing(e.to_string()))?;

    Ok(Account::new(&new.email, password_hash))
}

/// Hash of a fixed throwaway password with the store's Argon2 costs
///
/// Empty if hashing fails, which makes the miss path fast but never wrong.
pub(crate) fn timing_hash(password_config: &PasswordConfig) -> String {
    hash_password("studybuddy-unknown-account", password_config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not build timing hash");
        String::new()
    })
}

pub(crate) fn email_taken_error() -> CreateAccountError {
    let mut errors = ValidationErrors::new();
    errors.add("Email has already been taken");
    CreateAccountError::Invalid(errors)
}

/// Account row from database
#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
    password_config: PasswordConfig,
    timing_hash: String,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool, password_config: PasswordConfig) -> Self {
        Self {
            pool,
            timing_hash: timing_hash(&password_config),
            password_config,
        }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, new: NewAccount) -> Result<Account, CreateAccountError> {
        let email = normalize_email(&new.email);
        let taken = !email.is_empty() && self.find_by_email(&email).await?.is_some();
        let account = prepare_account(&new, taken, &self.password_config)?;

        let result = sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            // Lost a race with a concurrent signup for the same email
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(email_taken_error()),
            Err(e) => Err(CoreError::Database(format!("Failed to create user: {e}")).into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE lower(email) = $1",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::Database(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::Database(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(Account::from))
    }

    fn timing_hash(&self) -> &str {
        &self.timing_hash
    }
}

/// PostgreSQL-backed denylist
#[derive(Clone)]
pub struct PgDenylistStore {
    pool: PgPool,
}

impl PgDenylistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DenylistStore for PgDenylistStore {
    async fn insert(&self, entry: DenylistEntry) -> Result<(), CoreError> {
        sqlx::query("INSERT INTO jwt_denylist (jti, exp) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING")
            .bind(&entry.jti)
            .bind(entry.exp)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to revoke token: {e}")))?;

        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, CoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM jwt_denylist WHERE jti = $1)")
            .bind(jti)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to check denylist: {e}")))
    }

    async fn count(&self) -> Result<u64, CoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jwt_denylist")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to count denylist: {e}")))?;

        Ok(count.max(0) as u64)
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM jwt_denylist WHERE exp <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::Database(format!("Failed to prune denylist: {e}")))?;

        Ok(result.rows_affected())
    }
}
