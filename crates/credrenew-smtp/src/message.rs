//! Envelope and plain-text message construction.

use chrono::{DateTime, Utc};

use crate::types::Address;

/// Sender and recipients for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// MAIL FROM address.
    pub from: Address,
    /// RCPT TO addresses.
    pub to: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(from: Address, to: Vec<Address>) -> Self {
        Self { from, to }
    }
}

/// A UTF-8 plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: String,
    to: Vec<String>,
    subject: String,
    body: String,
    date: DateTime<Utc>,
}

impl Message {
    /// Creates a message whose From and To headers mirror the envelope.
    #[must_use]
    pub fn new(envelope: &Envelope, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: envelope.from.to_string(),
            to: envelope.to.iter().map(ToString::to_string).collect(),
            subject: subject.into(),
            body: body.into(),
            date: Utc::now(),
        }
    }

    /// Overrides the Date header.
    #[must_use]
    pub const fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Returns the subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Renders the message with CRLF line endings.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let subject: String = self.subject.chars().filter(|c| !c.is_control()).collect();
        let mut out = String::new();
        out.push_str(&format!("From: <{}>\r\n", self.from));
        out.push_str(&format!(
            "To: {}\r\n",
            self.to
                .iter()
                .map(|a| format!("<{a}>"))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        out.push_str(&format!("Subject: {subject}\r\n"));
        out.push_str(&format!("Date: {}\r\n", self.date.to_rfc2822()));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        out.push_str("Content-Transfer-Encoding: 8bit\r\n");
        out.push_str("\r\n");
        for line in self.body.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.into_bytes()
    }
}
