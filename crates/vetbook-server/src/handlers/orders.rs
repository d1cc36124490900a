//! `/api/orders` — dual-store CRUD for product sales.
//!
//! Create is the canonical dual write: validate the client, price the
//! lines (reserving stock as each is accepted), insert the row in its own
//! relational transaction, then write the companion document best-effort.
//! A pricing failure aborts before any row exists, but stock already
//! reserved for earlier lines stays reserved — the documented non-atomic
//! gap of the two-store design.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  document::OrderDetails,
  record::{FulfillmentStatus, NewOrder, OrderPatch, PaymentStatus},
  store::{DocumentStore, OrderFilter, RelationalStore},
};

use super::{page_of, store_err};
use crate::{
  AppState,
  auth::Principal,
  compose,
  error::ApiError,
  pricing::{self, ProductLineRequest},
  response::{self, Paged, Pagination},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:           Option<u32>,
  pub limit:          Option<u32>,
  pub payment_status: Option<PaymentStatus>,
  /// Fulfillment status; named `status` on the wire.
  pub status:         Option<FulfillmentStatus>,
}

/// `GET /api/orders` — each item is composed with its companion document.
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
  let filter = OrderFilter {
    payment_status:     params.payment_status,
    fulfillment_status: params.status,
  };
  let (rows, total) =
    state.rel.list_orders(filter, page).await.map_err(store_err)?;

  let mut items = Vec::with_capacity(rows.len());
  for (order, client) in &rows {
    let details =
      state.doc.get_order_details(order.id).await.map_err(store_err)?;
    items.push(compose::order(&state.cipher, order, client.as_ref(), details));
  }

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub client_id:          Option<i64>,
  #[serde(default)]
  pub products:           Vec<ProductLineRequest>,
  pub payment_status:     Option<PaymentStatus>,
  pub fulfillment_status: Option<FulfillmentStatus>,
  pub notes:              Option<String>,
  pub discount_cents:     Option<i64>,
  pub tax_cents:          Option<i64>,
}

/// `POST /api/orders` — the dual write.
pub async fn create<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Json(body): Json<CreateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  if body.products.is_empty() {
    return Err(ApiError::Validation(vec![
      json!({ "field": "products", "message": "at least one product line is required" }),
    ]));
  }

  let client = match body.client_id {
    Some(client_id) => Some(
      state
        .rel
        .get_owner(client_id)
        .await
        .map_err(store_err)?
        .ok_or(ApiError::ClientNotFound(client_id))?,
    ),
    None => None,
  };

  // Prices and reserves stock line by line; on failure no order row exists
  // yet, but earlier lines' reservations stand.
  let (total_cents, lines) =
    pricing::price_products(&*state.doc, &body.products).await?;

  let order = state
    .rel
    .add_order(NewOrder {
      client_id: body.client_id,
      total_cents,
      payment_status: body.payment_status.unwrap_or(PaymentStatus::Pending),
      fulfillment_status: body
        .fulfillment_status
        .unwrap_or(FulfillmentStatus::Unfulfilled),
    })
    .await
    .map_err(store_err)?;

  // Companion document; best-effort after the row committed. A failure
  // leaves a row-only order that every read path composes from defaults.
  let details = OrderDetails {
    order_id:       order.id,
    products:       lines,
    notes:          body.notes.unwrap_or_default(),
    discount_cents: body.discount_cents.unwrap_or(0),
    tax_cents:      body.tax_cents.unwrap_or(0),
  };
  let details = match state.doc.put_order_details(details.clone()).await {
    Ok(()) => Some(details),
    Err(e) => {
      tracing::warn!(order = order.id, error = %e, "order details write failed");
      None
    }
  };

  tracing::info!(order = order.id, by = principal.id, "order created");
  Ok(response::created(compose::order(
    &state.cipher,
    &order,
    client.as_ref(),
    details,
  )))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub payment_status:     Option<PaymentStatus>,
  pub fulfillment_status: Option<FulfillmentStatus>,
  pub notes:              Option<String>,
}

/// `PUT /api/orders/{id}` — the relational patch and the document
/// merge-patch are independent; either side may be absent. A notes patch
/// against a missing document upserts it.
pub async fn update<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let patch = OrderPatch {
    payment_status:     body.payment_status,
    fulfillment_status: body.fulfillment_status,
  };
  // An empty patch degrades to an existence check inside the store.
  state
    .rel
    .update_order(id, patch)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::OrderNotFound(id))?;

  if let Some(notes) = body.notes {
    state
      .doc
      .merge_order_details(id, vetbook_core::document::OrderDetailsPatch {
        notes: Some(notes),
      })
      .await
      .map_err(store_err)?;
  }

  let (order, client) = state
    .rel
    .get_order(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::OrderNotFound(id))?;
  let details = state.doc.get_order_details(id).await.map_err(store_err)?;

  tracing::info!(order = id, by = principal.id, "order updated");
  Ok(response::ok_message(
    compose::order(&state.cipher, &order, client.as_ref(), details),
    "order updated",
  ))
}

// ─── Details ─────────────────────────────────────────────────────────────────

/// `GET /api/orders/{id}/details` — the fully composed aggregate.
pub async fn details<R, D>(
  _principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let (order, client) = state
    .rel
    .get_order(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::OrderNotFound(id))?;
  let details = state.doc.get_order_details(id).await.map_err(store_err)?;

  Ok(response::ok(compose::order(
    &state.cipher,
    &order,
    client.as_ref(),
    details,
  )))
}
