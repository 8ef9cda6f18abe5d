//! AES-256-GCM sealing of secret fields.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Length of a vault key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Length of an IV/nonce in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// Process-wide encryption key.
///
/// The key bytes are wiped from memory when the value is dropped and are
/// never printed by `Debug`.
#[derive(Clone)]
pub struct VaultKey(Zeroizing<[u8; KEY_LEN]>);

impl VaultKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Generates a fresh random key from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    /// Parses a base64-encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if the input is not base64 or does not
    /// decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| Error::InvalidKey(e.to_string()))?,
        );
        let bytes: [u8; KEY_LEN] = decoded.as_slice().try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Encodes the key as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0[..])
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0[..]))
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

/// A 96-bit initialization vector.
///
/// One `Iv` is generated per account and stored alongside its ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    /// Creates an IV from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Generates a random IV from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses a base64-encoded IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIv`] if the input is not base64 or does not
    /// decode to exactly 12 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::InvalidIv(e.to_string()))?;
        let bytes: [u8; IV_LEN] = decoded.as_slice().try_into().map_err(|_| {
            Error::InvalidIv(format!("expected {IV_LEN} bytes, got {}", decoded.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Encodes the IV as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Returns the raw IV bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }

    /// Derives the nonce for one field of a record.
    ///
    /// A record stores a single IV but seals several fields under the same
    /// key. Reusing that IV verbatim for every field would repeat a GCM nonce,
    /// so each field slot flips the final byte by its index instead. Slot `0`
    /// returns the IV unchanged; distinct slots always yield distinct nonces.
    #[must_use]
    pub const fn for_field(&self, slot: u8) -> Self {
        let mut bytes = self.0;
        bytes[IV_LEN - 1] ^= slot;
        Self(bytes)
    }
}

/// Encrypts `plaintext` under `key` with nonce `iv`.
///
/// The result is the ciphertext followed by the 16-byte authentication tag.
///
/// # Errors
///
/// Returns [`Error::Encrypt`] if the cipher rejects the input.
pub fn encrypt(plaintext: &[u8], key: &VaultKey, iv: &Iv) -> Result<Vec<u8>> {
    key.cipher()
        .encrypt(Nonce::from_slice(&iv.0), plaintext)
        .map_err(|_| Error::Encrypt)
}

/// Decrypts and authenticates `ciphertext` under `key` with nonce `iv`.
///
/// # Errors
///
/// Returns [`Error::Integrity`] if the tag does not verify, which covers both
/// a wrong key and any modification of the ciphertext.
pub fn decrypt(ciphertext: &[u8], key: &VaultKey, iv: &Iv) -> Result<Vec<u8>> {
    key.cipher()
        .decrypt(Nonce::from_slice(&iv.0), ciphertext)
        .map_err(|_| Error::Integrity)
}

/// Encrypts a string and returns the ciphertext as base64.
///
/// # Errors
///
/// Returns an error if encryption fails.
pub fn seal(plaintext: &str, key: &VaultKey, iv: &Iv) -> Result<String> {
    let ciphertext = encrypt(plaintext.as_bytes(), key, iv)?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decodes base64 ciphertext produced by [`seal`] and decrypts it.
///
/// # Errors
///
/// Returns an error if the input is not base64, fails authentication, or
/// does not decrypt to UTF-8.
pub fn open(sealed: &str, key: &VaultKey, iv: &Iv) -> Result<String> {
    let ciphertext = STANDARD.decode(sealed)?;
    let plaintext = decrypt(&ciphertext, key, iv)?;
    Ok(String::from_utf8(plaintext)?)
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
    use proptest::prelude::*;

    fn fixed_key(byte: u8) -> VaultKey {
        VaultKey::from_bytes([byte; KEY_LEN])
    }

    #[test]
    fn test_round_trip() {
        let key = fixed_key(7);
        let iv = Iv::generate();
        let ciphertext = encrypt(b"sensitive data", &key, &iv).unwrap();
        assert_ne!(ciphertext.as_slice(), b"sensitive data");
        assert_eq!(decrypt(&ciphertext, &key, &iv).unwrap(), b"sensitive data");
    }

    #[test]
    fn test_ciphertext_carries_tag() {
        let key = fixed_key(1);
        let iv = Iv::generate();
        let ciphertext = encrypt(b"abc", &key, &iv).unwrap();
        assert_eq!(ciphertext.len(), 3 + 16);
    }

    #[test]
    fn test_wrong_key_fails_integrity() {
        let iv = Iv::generate();
        let ciphertext = encrypt(b"p1", &fixed_key(1), &iv).unwrap();
        let result = decrypt(&ciphertext, &fixed_key(2), &iv);
        assert!(matches!(result, Err(Error::Integrity)));
    }

    #[test]
    fn test_tampered_ciphertext_fails_integrity() {
        let key = fixed_key(3);
        let iv = Iv::generate();
        let mut ciphertext = encrypt(b"SEED123", &key, &iv).unwrap();
        ciphertext[0] ^= 0x01;
        assert!(matches!(decrypt(&ciphertext, &key, &iv), Err(Error::Integrity)));
    }

    #[test]
    fn test_truncated_ciphertext_fails_integrity() {
        let key = fixed_key(3);
        let iv = Iv::generate();
        let ciphertext = encrypt(b"SEED123", &key, &iv).unwrap();
        let truncated = &ciphertext[..ciphertext.len() - 1];
        assert!(matches!(decrypt(truncated, &key, &iv), Err(Error::Integrity)));
    }

    #[test]
    fn test_wrong_iv_fails_integrity() {
        let key = fixed_key(4);
        let iv = Iv::from_bytes([9; IV_LEN]);
        let ciphertext = encrypt(b"a@x.com", &key, &iv).unwrap();
        assert!(matches!(
            decrypt(&ciphertext, &key, &iv.for_field(1)),
            Err(Error::Integrity)
        ));
    }

    #[test]
    fn test_field_nonces_are_distinct() {
        let iv = Iv::from_bytes([0xAB; IV_LEN]);
        let identifier = iv.for_field(0);
        let secret = iv.for_field(1);
        let seed = iv.for_field(2);
        assert_eq!(identifier, iv);
        assert_ne!(identifier, secret);
        assert_ne!(secret, seed);
        assert_ne!(identifier, seed);
        assert_eq!(secret.as_bytes()[..IV_LEN - 1], iv.as_bytes()[..IV_LEN - 1]);
    }

    #[test]
    fn test_same_plaintext_differs_per_field() {
        let key = fixed_key(5);
        let iv = Iv::generate();
        let a = seal("same", &key, &iv.for_field(0)).unwrap();
        let b = seal("same", &key, &iv.for_field(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_base64_round_trip() {
        let key = VaultKey::generate();
        let parsed = VaultKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(parsed.to_base64(), key.to_base64());
    }

    #[test]
    fn test_key_rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            VaultKey::from_base64(&short),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            VaultKey::from_base64("not base64!"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_iv_base64_round_trip() {
        let iv = Iv::generate();
        assert_eq!(Iv::from_base64(&iv.to_base64()).unwrap(), iv);
        assert!(matches!(Iv::from_base64("AAAA"), Err(Error::InvalidIv(_))));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = fixed_key(0x41);
        let printed = format!("{key:?}");
        assert_eq!(printed, "VaultKey(<redacted>)");
    }

    #[test]
    fn test_open_rejects_bad_base64() {
        let key = fixed_key(6);
        let iv = Iv::generate();
        assert!(matches!(open("%%%", &key, &iv), Err(Error::Encoding(_))));
    }

    proptest! {
        #[test]
        fn prop_seal_open_round_trip(plaintext in ".*", key_byte in any::<u8>(), iv_bytes in any::<[u8; IV_LEN]>()) {
            let key = fixed_key(key_byte);
            let iv = Iv::from_bytes(iv_bytes);
            let sealed = seal(&plaintext, &key, &iv).unwrap();
            prop_assert_eq!(open(&sealed, &key, &iv).unwrap(), plaintext);
        }

        #[test]
        fn prop_flipped_bit_never_decrypts(plaintext in proptest::collection::vec(any::<u8>(), 0..64), position in any::<prop::sample::Index>(), bit in 0u8..8) {
            let key = fixed_key(9);
            let iv = Iv::from_bytes([3; IV_LEN]);
            let mut ciphertext = encrypt(&plaintext, &key, &iv).unwrap();
            let index = position.index(ciphertext.len());
            ciphertext[index] ^= 1 << bit;
            prop_assert!(matches!(decrypt(&ciphertext, &key, &iv), Err(Error::Integrity)));
        }
    }
}
