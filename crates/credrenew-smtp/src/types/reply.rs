//! SMTP reply types.

use std::fmt;

/// SMTP reply from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns true for a 2xx reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns all lines joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Converts the reply into an error unless its code is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Smtp`] carrying the server's code and text.
    pub fn expect_code(self, expected: ReplyCode) -> crate::Result<Self> {
        if self.code == expected {
            Ok(self)
        } else {
            Err(crate::Error::smtp(self.code.as_u16(), self.text()))
        }
    }

    /// Converts the reply into an error unless it is 2xx.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Smtp`] carrying the server's code and text.
    pub fn expect_success(self) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(crate::Error::smtp(self.code.as_u16(), self.text()))
        }
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_OK: Self = Self(235);
    /// 250 Requested action completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_code() {
        let reply = Reply::new(ReplyCode::START_DATA, vec!["go ahead".into()]);
        assert!(reply.clone().expect_code(ReplyCode::START_DATA).is_ok());
        let err = reply.expect_code(ReplyCode::OK).unwrap_err();
        assert!(matches!(err, crate::Error::Smtp { code: 354, .. }));
    }

    #[test]
    fn test_expect_success() {
        let ok = Reply::new(ReplyCode::OK, vec!["fine".into()]);
        assert_eq!(ok.expect_success().unwrap().text(), "fine");

        let denied = Reply::new(
            ReplyCode::new(535),
            vec!["5.7.8 Authentication".into(), "credentials invalid".into()],
        );
        let err = denied.expect_success().unwrap_err();
        assert!(err.is_permanent());
        assert!(err.to_string().contains("credentials invalid"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ReplyCode::CLOSING.to_string(), "221");
    }
}
