//! HTTP handlers, one module per resource.
//!
//! The dual-write orchestration lives directly in the order, appointment,
//! pet and user handlers: relational write first (its own transaction),
//! companion document second, with the document step best-effort once the
//! row has committed.

pub mod appointments;
pub mod auth;
pub mod orders;
pub mod owners;
pub mod pets;
pub mod products;
pub mod services;
pub mod stats;
pub mod users;

use vetbook_cipher::FieldCipher;
use vetbook_core::store::Page;

use crate::error::ApiError;

/// Lift a store error across the trait boundary into the API taxonomy.
pub(crate) fn store_err<E>(e: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Store(Box::new(e))
}

/// Encrypt one protected field, mapping cipher failures to 500.
pub(crate) fn seal(cipher: &FieldCipher, value: &str) -> Result<String, ApiError> {
  cipher.encrypt(value).map_err(|e| ApiError::Internal(Box::new(e)))
}

/// Resolve the `page`/`limit` query pair with the 1/10 defaults.
pub(crate) fn page_of(page: Option<u32>, limit: Option<u32>) -> Page {
  Page::new(page.unwrap_or(1), limit.unwrap_or(10))
}
