//! SMTP commands used for submission.

use crate::types::Address;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// EHLO with the client's name.
    Ehlo(&'a str),
    /// STARTTLS upgrade.
    StartTls,
    /// AUTH PLAIN with the base64 initial response.
    AuthPlain(&'a str),
    /// MAIL FROM.
    MailFrom(&'a Address),
    /// RCPT TO.
    RcptTo(&'a Address),
    /// DATA.
    Data,
    /// QUIT.
    Quit,
}

impl Command<'_> {
    /// Serializes the command including the trailing CRLF.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let line = match self {
            Self::Ehlo(name) => format!("EHLO {name}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain(response) => format!("AUTH PLAIN {response}"),
            Self::MailFrom(from) => format!("MAIL FROM:<{from}>"),
            Self::RcptTo(to) => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        };
        let mut bytes = line.into_bytes();
        bytes.extend_from_slice(b"\r\n");
        bytes
    }

    /// Returns a loggable form with credentials masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::AuthPlain(_) => "AUTH PLAIN ***".to_string(),
            other => String::from_utf8_lossy(&other.to_bytes())
                .trim_end()
                .to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        let from = Address::new("bot@example.com").unwrap();
        let to = Address::new("ops@example.com").unwrap();
        assert_eq!(Command::Ehlo("renewer").to_bytes(), b"EHLO renewer\r\n");
        assert_eq!(Command::StartTls.to_bytes(), b"STARTTLS\r\n");
        assert_eq!(
            Command::MailFrom(&from).to_bytes(),
            b"MAIL FROM:<bot@example.com>\r\n"
        );
        assert_eq!(
            Command::RcptTo(&to).to_bytes(),
            b"RCPT TO:<ops@example.com>\r\n"
        );
        assert_eq!(Command::Data.to_bytes(), b"DATA\r\n");
        assert_eq!(Command::Quit.to_bytes(), b"QUIT\r\n");
    }

    #[test]
    fn test_auth_is_redacted() {
        let cmd = Command::AuthPlain("AHVzZXIAcGFzcw==");
        assert_eq!(cmd.to_bytes(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert_eq!(cmd.redacted(), "AUTH PLAIN ***");
        assert_eq!(Command::Ehlo("x").redacted(), "EHLO x");
    }
}
