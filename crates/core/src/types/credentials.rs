//! Punch-out login credentials.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::punchout::LoginRequest;

/// Errors that can occur when building [`Credentials`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// The email field is empty.
    #[error("Email is required")]
    MissingEmail,
    /// The password field is empty.
    #[error("Password is required")]
    MissingPassword,
}

/// Credentials for the supplier's cross-site login.
///
/// Built from the submitted login form for a single attempt and dropped
/// afterwards. The password is held as a [`SecretString`] so it never shows
/// up in `Debug` output or logs.
///
/// ## Examples
///
/// ```
/// use mechanic_shop_core::Credentials;
/// use secrecy::SecretString;
///
/// let creds = Credentials::new("tech@shop.test", SecretString::from("hunter2"), None).unwrap();
/// assert_eq!(creds.account_id(), "");
///
/// assert!(Credentials::new("", SecretString::from("hunter2"), None).is_err());
/// ```
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
    account_id: String,
}

impl Credentials {
    /// Build credentials from raw form values.
    ///
    /// The email is trimmed. A missing account ID becomes an empty string,
    /// which is still sent to the login endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or password is empty.
    pub fn new(
        email: &str,
        password: SecretString,
        account_id: Option<String>,
    ) -> Result<Self, CredentialsError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialsError::MissingEmail);
        }
        if password.expose_secret().is_empty() {
            return Err(CredentialsError::MissingPassword);
        }

        Ok(Self {
            email: email.to_owned(),
            password,
            account_id: account_id.unwrap_or_default(),
        })
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the optional account ID, empty when not supplied.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Borrow the credentials as the login request body.
    ///
    /// This is the only place the password leaves its secret wrapper.
    #[must_use]
    pub fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            email: &self.email,
            password: self.password.expose_secret(),
            account_id: &self.account_id,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[test]
    fn test_new_trims_email() {
        let creds = Credentials::new("  tech@shop.test ", secret("pw"), None).unwrap();
        assert_eq!(creds.email(), "tech@shop.test");
    }

    #[test]
    fn test_new_missing_email() {
        let err = Credentials::new("   ", secret("pw"), None).unwrap_err();
        assert_eq!(err, CredentialsError::MissingEmail);
    }

    #[test]
    fn test_new_missing_password() {
        let err = Credentials::new("tech@shop.test", secret(""), None).unwrap_err();
        assert_eq!(err, CredentialsError::MissingPassword);
    }

    #[test]
    fn test_account_id_defaults_to_empty() {
        let creds = Credentials::new("tech@shop.test", secret("pw"), None).unwrap();
        assert_eq!(creds.account_id(), "");

        let creds =
            Credentials::new("tech@shop.test", secret("pw"), Some("ACME-7".to_string())).unwrap();
        assert_eq!(creds.account_id(), "ACME-7");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("tech@shop.test", secret("hunter2"), None).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
