//! `/api/products` — document-backed catalog CRUD.
//!
//! Catalog fields are unencrypted, so `search`/`category`/`active` become
//! store-level predicates. Stock changes only ever travel through the
//! store's guarded atomic adjustment.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use vetbook_core::{
  document::{NewProduct, ProductPatch},
  record::Role,
  store::{DocumentStore, ProductFilter, RelationalStore, StockAdjust},
};

use super::{page_of, store_err};
use crate::{
  AppState,
  auth::{Principal, require_role},
  error::ApiError,
  response::{self, Paged, Pagination},
  validate::Violations,
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:     Option<u32>,
  pub limit:    Option<u32>,
  pub search:   Option<String>,
  pub category: Option<String>,
  pub active:   Option<bool>,
}

/// `GET /api/products`
pub async fn list<R, D>(
  _principal: Principal,
  State(state): State<AppState<R, D>>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let page = page_of(params.page, params.limit);
  let filter = ProductFilter {
    search:   params.search,
    category: params.category,
    active:   params.active,
  };
  let (items, total) =
    state.doc.list_products(filter, page).await.map_err(store_err)?;

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock:       Option<i64>,
  pub category:    Option<String>,
  pub image:       Option<String>,
  pub active:      Option<bool>,
}

/// `POST /api/products` — admin only.
pub async fn create<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Json(body): Json<CreateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator])?;

  let mut violations = Violations::new();
  let name = violations.require_str("name", body.name.as_deref());
  match body.price_cents {
    None => violations.add("price_cents", "is required"),
    Some(p) if p < 0 => violations.add("price_cents", "must not be negative"),
    Some(_) => {}
  }
  if let Some(stock) = body.stock
    && stock < 0
  {
    violations.add("stock", "must not be negative");
  }
  violations.finish()?;

  let product = state
    .doc
    .add_product(NewProduct {
      name:        name.unwrap_or_default().to_owned(),
      description: body.description.unwrap_or_default(),
      price_cents: body.price_cents.unwrap_or_default(),
      stock:       body.stock.unwrap_or(0),
      category:    body.category.unwrap_or_default(),
      image:       body.image,
      active:      body.active.unwrap_or(true),
    })
    .await
    .map_err(store_err)?;

  tracing::info!(product = %product.id, by = principal.id, "product created");
  Ok(response::created(product))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock:       Option<i64>,
  pub category:    Option<String>,
  pub image:       Option<String>,
  pub active:      Option<bool>,
}

/// `PUT /api/products/{id}` — admin only.
pub async fn update<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator])?;

  let mut violations = Violations::new();
  if let Some(price) = body.price_cents
    && price < 0
  {
    violations.add("price_cents", "must not be negative");
  }
  if let Some(stock) = body.stock
    && stock < 0
  {
    violations.add("stock", "must not be negative");
  }
  violations.finish()?;

  let product = state
    .doc
    .update_product(id, ProductPatch {
      name:        body.name,
      description: body.description,
      price_cents: body.price_cents,
      stock:       body.stock,
      category:    body.category,
      image:       body.image,
      active:      body.active,
    })
    .await
    .map_err(store_err)?
    .ok_or(ApiError::ProductNotFound(id))?;

  tracing::info!(product = %id, by = principal.id, "product updated");
  Ok(response::ok_message(product, "product updated"))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/products/{id}` — admin only.
pub async fn remove<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator])?;

  if !state.doc.delete_product(id).await.map_err(store_err)? {
    return Err(ApiError::ProductNotFound(id));
  }

  tracing::info!(product = %id, by = principal.id, "product deleted");
  Ok(response::ok_message(json!({ "id": id }), "product deleted"))
}

// ─── Stock ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StockBody {
  pub operation: Option<String>,
  pub quantity:  Option<i64>,
}

/// `PATCH /api/products/{id}/stock` — `{operation: add|subtract, quantity}`.
/// Administrators and receptionists.
pub async fn adjust_stock<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StockBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator, Role::Receptionist])?;

  let mut violations = Violations::new();
  let sign = match body.operation.as_deref() {
    Some("add") => 1,
    Some("subtract") => -1,
    _ => {
      violations.add("operation", "must be \"add\" or \"subtract\"");
      0
    }
  };
  match body.quantity {
    Some(q) if q >= 1 => {}
    _ => violations.add("quantity", "must be at least 1"),
  }
  violations.finish()?;
  let delta = sign * body.quantity.unwrap_or_default();

  match state.doc.adjust_stock(id, delta).await.map_err(store_err)? {
    StockAdjust::Adjusted(product) => {
      tracing::info!(product = %id, delta, by = principal.id, "stock adjusted");
      Ok(response::ok_message(product, "stock updated"))
    }
    StockAdjust::NotFound => Err(ApiError::ProductNotFound(id)),
    StockAdjust::Insufficient { name, stock } => {
      Err(ApiError::InsufficientStock { name, stock })
    }
  }
}
