//! Symmetric field cipher for protected personal data.
//!
//! Encrypts scalar string fields (names, emails, phones) for at-rest
//! storage in ordinary text columns. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! Two properties drive the design:
//!
//! - **Non-deterministic ciphertext.** Every call draws a fresh random
//!   nonce, so equal plaintexts never produce equal stored values and the
//!   stored column carries no equality structure. Equality lookups instead
//!   go through [`FieldCipher::search_token`], a keyed deterministic digest
//!   stored next to the ciphertext.
//! - **Lossy-but-safe reads.** [`FieldCipher::decrypt`] never fails: stored
//!   text that does not decode (legacy plaintext, truncation, key change)
//!   is returned unchanged with a warning. A crashed read path is worse
//!   than a passthrough value in this domain.
//!
//! Wire format of an encrypted field: `base64(nonce ‖ ciphertext ‖ tag)`
//! with a 96-bit nonce and AES-256-GCM. Empty strings pass through both
//! directions untouched.

use aes_gcm::{
  Aes256Gcm, Key, Nonce,
  aead::{Aead, KeyInit},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

pub mod error;

pub use error::{Error, Result};

/// Nonce length of AES-GCM, in bytes.
const NONCE_LEN: usize = 12;

/// Process-wide field cipher, keyed once from the configured secret.
///
/// Cheap to clone behind an `Arc`; all methods take `&self`.
pub struct FieldCipher {
  aead:      Aes256Gcm,
  token_key: [u8; 32],
}

impl FieldCipher {
  /// Derive the AES key and the search-token key from one secret string.
  ///
  /// The two keys are domain-separated so a search token never doubles as
  /// key material for the AEAD.
  pub fn new(secret: &str) -> Self {
    let key = Sha256::digest(secret.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"/search-token");
    let token_key: [u8; 32] = hasher.finalize().into();

    FieldCipher {
      aead: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
      token_key,
    }
  }

  /// Encrypt one field value. Empty input passes through unchanged.
  pub fn encrypt(&self, plaintext: &str) -> Result<String> {
    if plaintext.is_empty() {
      return Ok(String::new());
    }

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let sealed = self
      .aead
      .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
      .map_err(|_| Error::Encrypt)?;

    let mut buf = Vec::with_capacity(NONCE_LEN + sealed.len());
    buf.extend_from_slice(&nonce);
    buf.extend_from_slice(&sealed);
    Ok(B64.encode(buf))
  }

  /// Decrypt one stored field value.
  ///
  /// Total: malformed input (bad base64, short buffer, failed tag check,
  /// non-UTF-8 plaintext) is returned unchanged after logging a warning.
  pub fn decrypt(&self, stored: &str) -> String {
    if stored.is_empty() {
      return String::new();
    }

    match self.try_decrypt(stored) {
      Some(plaintext) => plaintext,
      None => {
        tracing::warn!("undecryptable field value, passing through as-is");
        stored.to_owned()
      }
    }
  }

  fn try_decrypt(&self, stored: &str) -> Option<String> {
    let buf = B64.decode(stored).ok()?;
    if buf.len() <= NONCE_LEN {
      return None;
    }
    let (nonce, sealed) = buf.split_at(NONCE_LEN);
    let plaintext = self.aead.decrypt(Nonce::from_slice(nonce), sealed).ok()?;
    String::from_utf8(plaintext).ok()
  }

  /// Deterministic searchable token for equality lookups on an encrypted
  /// field: `hex(sha256(token_key ‖ trim(lowercase(value))))`.
  ///
  /// Normalisation means `"Ana@Vet.example "` and `"ana@vet.example"`
  /// tokenise identically.
  pub fn search_token(&self, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.token_key);
    hasher.update(value.trim().to_ascii_lowercase().as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl std::fmt::Debug for FieldCipher {
  // Key material stays out of Debug output.
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FieldCipher").finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cipher() -> FieldCipher {
    FieldCipher::new("unit-test-secret")
  }

  #[test]
  fn round_trip() {
    let c = cipher();
    for input in ["ana", "Ana García", "+52 555 0123", "a@b.example", "🐕"] {
      let sealed = c.encrypt(input).unwrap();
      assert_ne!(sealed, input);
      assert_eq!(c.decrypt(&sealed), input);
    }
  }

  #[test]
  fn empty_passes_through_both_ways() {
    let c = cipher();
    assert_eq!(c.encrypt("").unwrap(), "");
    assert_eq!(c.decrypt(""), "");
  }

  #[test]
  fn equal_plaintexts_yield_distinct_ciphertexts() {
    let c = cipher();
    let a = c.encrypt("same value").unwrap();
    let b = c.encrypt("same value").unwrap();
    assert_ne!(a, b);
    assert_eq!(c.decrypt(&a), "same value");
    assert_eq!(c.decrypt(&b), "same value");
  }

  #[test]
  fn malformed_input_passes_through() {
    let c = cipher();
    // Legacy plaintext, non-base64 and truncated-but-valid base64.
    for junk in ["not encrypted at all", "!!!", "AAAA"] {
      assert_eq!(c.decrypt(junk), junk);
    }
  }

  #[test]
  fn wrong_key_passes_through_instead_of_failing() {
    let sealed = FieldCipher::new("key-one").encrypt("secret").unwrap();
    assert_eq!(FieldCipher::new("key-two").decrypt(&sealed), sealed);
  }

  #[test]
  fn search_token_is_deterministic_and_normalised() {
    let c = cipher();
    assert_eq!(c.search_token("Ana@Vet.example "), c.search_token("ana@vet.example"));
    assert_ne!(c.search_token("ana@vet.example"), c.search_token("bob@vet.example"));
  }

  #[test]
  fn search_token_is_keyed() {
    let a = FieldCipher::new("key-one").search_token("ana@vet.example");
    let b = FieldCipher::new("key-two").search_token("ana@vet.example");
    assert_ne!(a, b);
  }
}
