//! Envelope addresses.

use std::fmt;

use crate::error::{Error, Result};

/// Email address for the SMTP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates an address after a basic shape check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is empty, lacks a
    /// single `@` with text on both sides, or contains characters that would
    /// break the command line.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let trimmed = addr.trim();

        if trimmed.is_empty() {
            return Err(Error::InvalidAddress("address cannot be empty".into()));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{trimmed}: contains forbidden characters"
            )));
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => {
                return Err(Error::InvalidAddress(format!(
                    "{trimmed}: expected local@domain"
                )));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new(" ops@example.com ").unwrap();
        assert_eq!(addr.as_str(), "ops@example.com");
        assert_eq!(addr.to_string(), "ops@example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in [
            "",
            "opsexample.com",
            "@example.com",
            "ops@",
            "a@b@c",
            "ops@ex ample.com",
            "ops@example.com>\r\nRCPT",
        ] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
