//! Error types for `vetbook-cipher`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// AEAD sealing failed. Practically unreachable with a well-formed key.
  #[error("field encryption failed")]
  Encrypt,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
