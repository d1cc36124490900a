//! API error taxonomy and its [`IntoResponse`] mapping.
//!
//! Every failure a handler can surface is one variant here, and every
//! variant maps to one stable `code` string so clients can branch on it
//! programmatically. Internal failures (store errors, crypto errors) are
//! logged with full detail server-side and reach the client as a generic
//! `INTERNAL_SERVER_ERROR`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid input")]
  Validation(Vec<serde_json::Value>),

  #[error("owner {0} not found")]
  OwnerNotFound(i64),

  #[error("pet {0} not found")]
  PetNotFound(i64),

  #[error("user {0} not found")]
  UserNotFound(i64),

  #[error("client {0} not found")]
  ClientNotFound(i64),

  #[error("order {0} not found")]
  OrderNotFound(i64),

  #[error("appointment {0} not found")]
  AppointmentNotFound(i64),

  #[error("product {0} not found")]
  ProductNotFound(Uuid),

  #[error("service {0} not found")]
  ServiceNotFound(Uuid),

  #[error("subcategory {subcategory} not found on service {service}")]
  SubcategoryNotFound { service: Uuid, subcategory: String },

  #[error("insufficient stock for {name}: {stock} available")]
  InsufficientStock { name: String, stock: i64 },

  #[error("owner {0} still has pets")]
  OwnerHasPets(i64),

  #[error("a user cannot delete their own account")]
  CannotDeleteSelf,

  #[error("email already registered")]
  EmailExists,

  #[error("authentication token required")]
  TokenRequired,

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("invalid authentication token")]
  InvalidToken,

  #[error("insufficient permissions")]
  InsufficientPermissions,

  #[error("route not found")]
  RouteNotFound,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// The stable machine-readable code for this error.
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::Validation(_) => "VALIDATION_ERROR",
      ApiError::OwnerNotFound(_) => "OWNER_NOT_FOUND",
      ApiError::PetNotFound(_) => "PET_NOT_FOUND",
      ApiError::UserNotFound(_) => "USER_NOT_FOUND",
      ApiError::ClientNotFound(_) => "CLIENT_NOT_FOUND",
      ApiError::OrderNotFound(_) => "ORDER_NOT_FOUND",
      ApiError::AppointmentNotFound(_) => "APPOINTMENT_NOT_FOUND",
      ApiError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
      ApiError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
      ApiError::SubcategoryNotFound { .. } => "SUBCATEGORY_NOT_FOUND",
      ApiError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
      ApiError::OwnerHasPets(_) => "OWNER_HAS_PETS",
      ApiError::CannotDeleteSelf => "CANNOT_DELETE_SELF",
      ApiError::EmailExists => "EMAIL_EXISTS",
      ApiError::TokenRequired => "TOKEN_REQUIRED",
      ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
      ApiError::InvalidToken => "INVALID_TOKEN",
      ApiError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
      ApiError::RouteNotFound => "NOT_FOUND",
      ApiError::Store(_) | ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_)
      | ApiError::InsufficientStock { .. }
      | ApiError::OwnerHasPets(_)
      | ApiError::CannotDeleteSelf
      | ApiError::EmailExists => StatusCode::BAD_REQUEST,

      ApiError::OwnerNotFound(_)
      | ApiError::PetNotFound(_)
      | ApiError::UserNotFound(_)
      | ApiError::ClientNotFound(_)
      | ApiError::OrderNotFound(_)
      | ApiError::AppointmentNotFound(_)
      | ApiError::ProductNotFound(_)
      | ApiError::ServiceNotFound(_)
      | ApiError::SubcategoryNotFound { .. }
      | ApiError::RouteNotFound => StatusCode::NOT_FOUND,

      ApiError::TokenRequired | ApiError::InvalidCredentials => {
        StatusCode::UNAUTHORIZED
      }
      ApiError::InvalidToken | ApiError::InsufficientPermissions => {
        StatusCode::FORBIDDEN
      }

      ApiError::Store(_) | ApiError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let code = self.code();

    // Clients see a generic message for internal failures; the detail goes
    // to the log only.
    let message = match &self {
      ApiError::Store(e) | ApiError::Internal(e) => {
        tracing::error!(error = %e, "internal server error");
        "internal server error".to_owned()
      }
      other => other.to_string(),
    };

    let body = match self {
      ApiError::Validation(details) => json!({
        "success": false,
        "error": message,
        "code": code,
        "details": details,
      }),
      _ => json!({
        "success": false,
        "error": message,
        "code": code,
      }),
    };

    (status, Json(body)).into_response()
  }
}
