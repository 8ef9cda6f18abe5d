//! # credrenew-vault
//!
//! Authenticated encryption for the secret fields of a stored account.
//!
//! Every secret is sealed with AES-256-GCM under a single process-wide
//! [`VaultKey`]. Each account carries one 96-bit [`Iv`]; the nonce used for an
//! individual field is derived from it with [`Iv::for_field`], so no
//! `(key, nonce)` pair is ever used twice for the same account.
//!
//! ## Example
//!
//! ```ignore
//! use credrenew_vault::{Iv, VaultKey, open, seal};
//!
//! let key = VaultKey::generate();
//! let iv = Iv::generate();
//!
//! let sealed = seal("hunter2", &key, &iv.for_field(1))?;
//! assert_eq!(open(&sealed, &key, &iv.for_field(1))?, "hunter2");
//! ```
//!
//! Tampering with the ciphertext, or opening it with another key, fails with
//! [`Error::Integrity`]; it never yields a partially decoded value.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cipher;
mod error;
pub mod key_source;

pub use cipher::{IV_LEN, Iv, KEY_LEN, VaultKey, decrypt, encrypt, open, seal};
pub use error::{Error, Result};
pub use key_source::{KEY_ENV_VAR, KeySource, resolve_key, store_in_keyring};
