//! Time-based one-time codes (RFC 6238).
//!
//! Seeds are base32 strings as shown by authenticator enrolment pages. They
//! are often displayed in groups (`abcd efgh ...`), so whitespace, hyphens
//! and padding are removed and the seed is upper-cased before decoding.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{Error, Result};

/// Number of digits in a generated code.
pub const DIGITS: usize = 6;

/// Time step in seconds.
pub const STEP_SECS: u64 = 30;

/// Strips separators and padding from a seed and upper-cases it.
#[must_use]
pub fn normalize_seed(seed: &str) -> String {
    seed.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn build(seed: &str) -> Result<TOTP> {
    let normalized = normalize_seed(seed);
    if normalized.is_empty() {
        return Err(Error::InvalidOtpSeed("seed is empty".into()));
    }

    let bytes = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|_| Error::InvalidOtpSeed("seed is not valid base32".into()))?;

    Ok(TOTP::new_unchecked(Algorithm::SHA1, DIGITS, 1, STEP_SECS, bytes))
}

/// Checks that a seed decodes to a usable shared secret.
///
/// # Errors
///
/// Returns [`Error::InvalidOtpSeed`] if the seed is empty or not base32.
pub fn validate_seed(seed: &str) -> Result<()> {
    build(seed).map(|_| ())
}

/// Generates the code for the given Unix time.
///
/// # Errors
///
/// Returns [`Error::InvalidOtpSeed`] if the seed is empty or not base32.
pub fn generate(seed: &str, unix_secs: u64) -> Result<String> {
    Ok(build(seed)?.generate(unix_secs))
}

/// Generates the code for the current time.
///
/// # Errors
///
/// Returns [`Error::InvalidOtpSeed`] if the seed is empty or not base32.
pub fn generate_now(seed: &str) -> Result<String> {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    generate(seed, now)
}
