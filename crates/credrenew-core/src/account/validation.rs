//! Credential validation at the store boundary.

use super::credentials::Credentials;

/// Validation error for submitted credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is empty.
    EmptyIdentifier,
    /// Identifier is not an email address.
    InvalidIdentifier,
    /// Passphrase is empty.
    EmptySecret,
    /// One-time-code seed is empty.
    EmptyOtpSeed,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyIdentifier => "Login identifier is required",
            Self::InvalidIdentifier => "Login identifier must be an email address",
            Self::EmptySecret => "Password is required",
            Self::EmptyOtpSeed => "TOTP seed is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyIdentifier | Self::InvalidIdentifier => "identifier",
            Self::EmptySecret => "secret",
            Self::EmptyOtpSeed => "otp_seed",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating credentials.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validates credentials before they are sealed and stored.
///
/// Returns every problem found, not just the first. The seed is only checked
/// for presence; a malformed seed surfaces when a code is generated at login.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any field is invalid.
pub fn validate_credentials(credentials: &Credentials) -> ValidationResult {
    let mut errors = Vec::new();

    if credentials.identifier.trim().is_empty() {
        errors.push(ValidationError::EmptyIdentifier);
    } else if !is_valid_email(&credentials.identifier) {
        errors.push(ValidationError::InvalidIdentifier);
    }

    if credentials.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }

    if credentials.otp_seed.trim().is_empty() {
        errors.push(ValidationError::EmptyOtpSeed);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email shape check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user@example..com"));
    }

    #[test]
    fn test_valid_credentials() {
        let creds = Credentials::new("user@example.com", "pw", "JBSW Y3DP EHPK 3PXP");
        assert!(validate_credentials(&creds).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let creds = Credentials::new("", "", "");
        let errors = validate_credentials(&creds).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyIdentifier,
                ValidationError::EmptySecret,
                ValidationError::EmptyOtpSeed,
            ]
        );
    }

    #[test]
    fn test_malformed_identifier() {
        let creds = Credentials::new("not-an-email", "pw", "0189!!");
        let errors = validate_credentials(&creds).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidIdentifier]);
        assert_eq!(ValidationError::EmptyOtpSeed.field(), "otp_seed");
    }

    #[test]
    fn test_non_base32_seed_is_accepted() {
        let creds = Credentials::new("a@x.com", "p1", "SEED123");
        assert!(validate_credentials(&creds).is_ok());
        assert!(is_valid_email("a@x.com"));
    }
}
