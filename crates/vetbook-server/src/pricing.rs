//! The price/stock resolution engine.
//!
//! Turns requested line-item references into priced snapshot lines and an
//! aggregate total, reserving product stock as it goes.
//!
//! Stock reservation semantics: each accepted product line decrements stock
//! through the store's guarded atomic adjustment as it is processed. When a
//! later line in the same request fails, decrements already applied are NOT
//! reversed — the caller's relational transaction never started or rolls
//! back, but the document store keeps the reservation. This mirrors the
//! system contract of best-effort dual writes; the gap is deliberate and
//! covered by tests at the server level.
//!
//! Output lines are snapshots (name, unit price at resolution time), meant
//! to be persisted verbatim into the companion document so later catalog
//! edits never rewrite history.

use serde::Deserialize;
use uuid::Uuid;
use vetbook_core::{
  document::{OrderLine, ServiceLine},
  store::{DocumentStore, StockAdjust},
};

use crate::{error::ApiError, validate::Violations};

/// One requested product line: a catalog reference plus a quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductLineRequest {
  pub product_id: Uuid,
  pub quantity:   i64,
}

/// One requested service line: a catalog reference plus an optional named
/// subcategory.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceLineRequest {
  pub service_id:     Uuid,
  pub subcategory_id: Option<String>,
}

/// Resolve and price product lines, reserving stock per accepted line.
///
/// Returns the total in cents and the snapshot lines. Fails with
/// `PRODUCT_NOT_FOUND` or `INSUFFICIENT_STOCK` naming the offending
/// reference; earlier lines' stock reservations stay applied (see module
/// docs).
pub async fn price_products<D: DocumentStore>(
  doc: &D,
  requests: &[ProductLineRequest],
) -> Result<(i64, Vec<OrderLine>), ApiError> {
  let mut violations = Violations::new();
  for (i, request) in requests.iter().enumerate() {
    if request.quantity < 1 {
      violations.add(&format!("products[{i}].quantity"), "must be at least 1");
    }
  }
  violations.finish()?;

  let mut total = 0i64;
  let mut lines = Vec::with_capacity(requests.len());

  for request in requests {
    let outcome = doc
      .adjust_stock(request.product_id, -request.quantity)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;

    let product = match outcome {
      StockAdjust::Adjusted(product) => product,
      StockAdjust::NotFound => {
        return Err(ApiError::ProductNotFound(request.product_id));
      }
      StockAdjust::Insufficient { name, stock } => {
        return Err(ApiError::InsufficientStock { name, stock });
      }
    };

    total += product.price_cents * request.quantity;
    lines.push(OrderLine {
      product_id:  product.id,
      name:        product.name,
      quantity:    request.quantity,
      price_cents: product.price_cents,
    });
  }

  Ok((total, lines))
}

/// Resolve and price service lines.
///
/// A named subcategory must exist on its service. With no subcategory
/// named, the first listed subcategory's price applies, or zero when the
/// service has none. No stock is involved; failure aborts the whole
/// request with nothing to unwind.
pub async fn price_services<D: DocumentStore>(
  doc: &D,
  requests: &[ServiceLineRequest],
) -> Result<(i64, Vec<ServiceLine>), ApiError> {
  let mut total = 0i64;
  let mut lines = Vec::with_capacity(requests.len());

  for request in requests {
    let service = doc
      .get_service(request.service_id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or(ApiError::ServiceNotFound(request.service_id))?;

    let price_cents = match &request.subcategory_id {
      Some(sub_id) => {
        service
          .subcategories
          .iter()
          .find(|sub| sub.id == *sub_id)
          .ok_or_else(|| ApiError::SubcategoryNotFound {
            service:     request.service_id,
            subcategory: sub_id.clone(),
          })?
          .price_cents
      }
      None => service.subcategories.first().map_or(0, |sub| sub.price_cents),
    };

    total += price_cents;
    lines.push(ServiceLine {
      service_id: service.id,
      name: service.name,
      price_cents,
      subcategory_id: request.subcategory_id.clone(),
    });
  }

  Ok((total, lines))
}
