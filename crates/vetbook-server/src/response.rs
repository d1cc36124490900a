//! Success envelope and pagination helpers.
//!
//! Every successful response is `{success: true, data, message?}`; list
//! payloads wrap their items as `{items, pagination}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use vetbook_core::store::Page;

/// The `pagination` block of a list payload.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
  pub total:       u64,
  pub page:        u32,
  pub limit:       u32,
  pub total_pages: u64,
}

impl Pagination {
  pub fn new(total: u64, page: Page) -> Self {
    Pagination {
      total,
      page: page.page,
      limit: page.limit,
      total_pages: total.div_ceil(u64::from(page.limit)),
    }
  }
}

/// A page of items plus its pagination block.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
  pub items:      Vec<T>,
  pub pagination: Pagination,
}

/// `200 OK` with data.
pub fn ok<T: Serialize>(data: T) -> Response {
  (StatusCode::OK, Json(json!({ "success": true, "data": data })))
    .into_response()
}

/// `200 OK` with data and a human-readable message.
pub fn ok_message<T: Serialize>(data: T, message: &str) -> Response {
  (
    StatusCode::OK,
    Json(json!({ "success": true, "data": data, "message": message })),
  )
    .into_response()
}

/// `201 Created` with data.
pub fn created<T: Serialize>(data: T) -> Response {
  (StatusCode::CREATED, Json(json!({ "success": true, "data": data })))
    .into_response()
}
