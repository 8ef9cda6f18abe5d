//! # credrenew-smtp
//!
//! A small SMTP submission client (RFC 5321) used to deliver renewal
//! notifications.
//!
//! ## Features
//!
//! - **Type-state connection management**: EHLO before AUTH, AUTH before MAIL
//!   is enforced at compile time
//! - **Transport agnostic**: works over any `AsyncRead + AsyncWrite` stream
//! - **TLS support**: implicit TLS (port 465) and STARTTLS (port 587)
//! - **Authentication**: AUTH PLAIN
//!
//! ## Quick Start
//!
//! ```ignore
//! use credrenew_smtp::{Address, Client, Envelope, Message};
//! use credrenew_smtp::connection::connect;
//!
//! let stream = connect("smtp.example.com", 587).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.ehlo("renewer.local").await?;
//! let client = client.starttls("smtp.example.com").await?;
//! let mut client = client.auth_plain("user@example.com", "password").await?;
//!
//! let envelope = Envelope::new(Address::new("bot@example.com")?, vec![Address::new("ops@example.com")?]);
//! let message = Message::new(&envelope, "Subject line", "Body text");
//! client.send(&envelope, &message.to_bytes()).await?;
//! client.quit().await?;
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ── ehlo() ──→ Greeted ── auth_plain() / without_auth() ──→ Ready
//!                            │                                          │
//!                            └── starttls() (TCP only) ──→ Greeted      └── send() ──→ Ready
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod message;
pub mod parser;
pub mod types;

pub use connection::{Client, Connected, Greeted, Ready, ServerInfo};
pub use error::{Error, Result};
pub use message::{Envelope, Message};
pub use types::{Address, Reply, ReplyCode};
