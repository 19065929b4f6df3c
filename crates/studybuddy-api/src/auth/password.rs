/// Argon2id password hashing
///
/// Hashes are PHC strings carrying algorithm, cost parameters, and salt,
/// so a stored hash verifies on its own even after the costs change.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use studybuddy_core::AuthConfig;
use thiserror::Error;

const HASH_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Password check failed: {0}")]
    VerificationFailed(String),

    #[error("Stored password hash is not a PHC string")]
    InvalidHashFormat,
}

/// Argon2 cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.password_memory_kib,
            time_cost: config.password_time_cost,
            parallelism: config.password_parallelism,
        }
    }
}

impl PasswordConfig {
    /// Smallest costs Argon2 accepts
    pub fn fast_for_tests() -> Self {
        Self {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(HASH_LEN),
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a plaintext password with a fresh random salt
///
/// # Example
///
/// ```no_run
/// use studybuddy_api::auth::password::{hash_password, PasswordConfig};
///
/// let hash = hash_password("secret1", &PasswordConfig::default()).unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str, config: &PasswordConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    config
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check a plaintext password against a stored PHC hash
///
/// A mismatch is `Ok(false)`; an unparseable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Costs are read from the PHC string
    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("secret1", &PasswordConfig::fast_for_tests()).unwrap();

        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let config = PasswordConfig::fast_for_tests();
        let first = hash_password("password123", &config).unwrap();
        let second = hash_password("password123", &config).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("password123", &second).unwrap());
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let hash = hash_password("password123", &PasswordConfig::fast_for_tests()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("password123"));
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("secret1", "not-a-phc-string"),
            Err(PasswordError::InvalidHashFormat)
        ));
    }

    #[test]
    fn test_costs_come_from_auth_config() {
        let auth = AuthConfig {
            password_memory_kib: 4096,
            password_time_cost: 2,
            password_parallelism: 2,
            ..Default::default()
        };

        let hash = hash_password("secret1", &PasswordConfig::from(&auth)).unwrap();
        assert!(hash.contains("m=4096,t=2,p=2"));
        assert!(verify_password("secret1", &hash).unwrap());
    }

    #[test]
    fn test_zero_costs_rejected() {
        let config = PasswordConfig {
            memory_cost: 0,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("secret1", &config),
            Err(PasswordError::HashingFailed(_))
        ));
    }
}
