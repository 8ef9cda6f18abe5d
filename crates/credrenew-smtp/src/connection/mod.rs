//! SMTP connection management with the type-state pattern.

mod client;
mod stream;

pub use client::{Client, Connected, Greeted, Ready};
pub use stream::{TlsStream, connect, connect_tls};

/// Server capabilities from the EHLO reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server name from the greeting.
    pub hostname: String,
    /// EHLO keyword lines, upper-cased (e.g. `AUTH PLAIN LOGIN`).
    pub extensions: Vec<String>,
}

impl ServerInfo {
    /// Parses the extension lines of an EHLO reply (the first line is the
    /// server's name and is skipped).
    #[must_use]
    pub fn with_ehlo(mut self, lines: &[String]) -> Self {
        self.extensions = lines
            .iter()
            .skip(1)
            .map(|l| l.trim().to_ascii_uppercase())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    /// Returns the parameters of an extension, if advertised.
    #[must_use]
    pub fn extension(&self, keyword: &str) -> Option<Vec<&str>> {
        self.extensions.iter().find_map(|line| {
            let mut parts = line.split_whitespace();
            (parts.next()? == keyword).then(|| parts.collect())
        })
    }

    /// Checks if STARTTLS is advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extension("STARTTLS").is_some()
    }

    /// Returns the advertised AUTH mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<&str> {
        self.extension("AUTH").unwrap_or_default()
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extension("SIZE")?.first()?.parse().ok()
    }
}
