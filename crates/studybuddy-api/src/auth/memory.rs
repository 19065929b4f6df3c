//! In-memory stores for tests and database-less development runs
//!
//! Same contracts as the PostgreSQL stores: emails are unique
//! case-insensitively and denylist inserts are idempotent.

use super::password::PasswordConfig;
use super::repository::{
    email_taken_error, prepare_account, timing_hash, CreateAccountError, CredentialStore,
    DenylistStore,
};
use super::validation::NewAccount;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use studybuddy_core::{normalize_email, Account, CoreError, DenylistEntry};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Credential store keyed by account id
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
    password_config: PasswordConfig,
    timing_hash: String,
}

impl InMemoryCredentialStore {
    pub fn new(password_config: PasswordConfig) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            timing_hash: timing_hash(&password_config),
            password_config,
        }
    }

    /// Delete an account, returning it if it existed
    pub async fn remove(&self, id: Uuid) -> Option<Account> {
        self.accounts.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

fn email_in_use(accounts: &HashMap<Uuid, Account>, email: &str) -> bool {
    !email.is_empty() && accounts.values().any(|a| a.email == email)
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, new: NewAccount) -> Result<Account, CreateAccountError> {
        let email = normalize_email(&new.email);
        let taken = email_in_use(&*self.accounts.read().await, &email);

        // Hash outside the write lock
        let account = prepare_account(&new, taken, &self.password_config)?;

        let mut accounts = self.accounts.write().await;
        if email_in_use(&accounts, &account.email) {
            return Err(email_taken_error());
        }
        accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, CoreError> {
        let email = normalize_email(email);
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, CoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    fn timing_hash(&self) -> &str {
        &self.timing_hash
    }
}

/// Denylist keyed by `jti`
#[derive(Default)]
pub struct InMemoryDenylistStore {
    entries: RwLock<HashMap<String, DenylistEntry>>,
}

impl InMemoryDenylistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DenylistStore for InMemoryDenylistStore {
    async fn insert(&self, entry: DenylistEntry) -> Result<(), CoreError> {
        self.entries
            .write()
            .await
            .entry(entry.jti.clone())
            .or_insert(entry);
        Ok(())
    }

    async fn contains(&self, jti: &str) -> Result<bool, CoreError> {
        Ok(self.entries.read().await.contains_key(jti))
    }

    async fn count(&self) -> Result<u64, CoreError> {
        Ok(self.entries.read().await.len() as u64)
    }

    async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64, CoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok((before - entries.len()) as u64)
    }
}
