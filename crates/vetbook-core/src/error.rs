//! Error types for `vetbook-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown payment status: {0:?}")]
  UnknownPaymentStatus(String),

  #[error("unknown fulfillment status: {0:?}")]
  UnknownFulfillmentStatus(String),

  #[error("unknown appointment status: {0:?}")]
  UnknownAppointmentStatus(String),

  #[error("unknown allergy severity: {0:?}")]
  UnknownAllergySeverity(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
