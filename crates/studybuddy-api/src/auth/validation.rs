//! Field validation for account registration
//!
//! Messages are full sentences, ready to be returned to clients as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidateEmail;

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Registration input as submitted by the client
#[derive(Clone, Default)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
}

impl NewAccount {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        password_confirmation: Option<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            password_confirmation,
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Ordered list of validation failure messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.0.iter().any(|m| m == message)
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate registration fields
///
/// `email_taken` is supplied by the store, which owns the uniqueness check.
pub fn validate_new_account(new: &NewAccount, email_taken: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let email = new.email.trim().to_string();
    if email.is_empty() {
        errors.add("Email can't be blank");
    } else if !email.validate_email() {
        errors.add("Email is invalid");
    }
    if email_taken {
        errors.add("Email has already been taken");
    }

    let password_len = new.password.chars().count();
    if new.password.is_empty() {
        errors.add("Password can't be blank");
    } else if password_len < PASSWORD_MIN_LEN {
        errors.add(format!(
            "Password is too short (minimum is {PASSWORD_MIN_LEN} characters)"
        ));
    } else if password_len > PASSWORD_MAX_LEN {
        errors.add(format!(
            "Password is too long (maximum is {PASSWORD_MAX_LEN} characters)"
        ));
    }

    if let Some(confirmation) = &new.password_confirmation {
        if confirmation != &new.password {
            errors.add("Password confirmation doesn't match Password");
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, password: &str, confirmation: Option<&str>) -> NewAccount {
        NewAccount::new(email, password, confirmation.map(str::to_string))
    }

    #[test]
    fn test_valid_input() {
        let errors = validate_new_account(
            &new_account("a@x.com", "secret1", Some("secret1")),
            false,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_confirmation_is_optional() {
        let errors = validate_new_account(&new_account("a@x.com", "secret1", None), false);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_blank_fields() {
        let errors = validate_new_account(&new_account("", "", None), false);
        assert_eq!(
            errors.messages(),
            &["Email can't be blank", "Password can't be blank"]
        );
    }

    #[test]
    fn test_invalid_email_and_short_password() {
        let errors = validate_new_account(&new_account("invalid-email", "123", Some("123")), false);
        assert!(errors.contains("Email is invalid"));
        assert!(errors.contains("Password is too short (minimum is 6 characters)"));
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_new_account(&new_account("a@x.com", "12345", None), false)
            .contains("Password is too short (minimum is 6 characters)"));
        assert!(validate_new_account(&new_account("a@x.com", "123456", None), false).is_empty());

        let long = "a".repeat(PASSWORD_MAX_LEN + 1);
        assert!(validate_new_account(&new_account("a@x.com", &long, None), false)
            .contains("Password is too long (maximum is 128 characters)"));
    }

    #[test]
    fn test_confirmation_mismatch() {
        let errors = validate_new_account(
            &new_account("a@x.com", "password123", Some("differentpassword")),
            false,
        );
        assert_eq!(
            errors.messages(),
            &["Password confirmation doesn't match Password"]
        );
    }

    #[test]
    fn test_email_taken() {
        let errors = validate_new_account(&new_account("a@x.com", "secret1", None), true);
        assert_eq!(errors.messages(), &["Email has already been taken"]);
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("Email is invalid");
        assert_eq!(errors.clone().into_result(), Err(errors));
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", new_account("a@x.com", "secret1", Some("secret1")));
        assert!(!rendered.contains("secret1"));
    }
}
