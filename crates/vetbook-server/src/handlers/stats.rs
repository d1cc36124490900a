//! `GET /api/stats` — entity counts across both stores, for the dashboard.
//! Administrators and veterinarians.

use axum::{extract::State, response::Response};
use serde_json::json;
use vetbook_core::{
  record::Role,
  store::{DocumentStore, RelationalStore},
};

use super::store_err;
use crate::{
  AppState,
  auth::{Principal, require_role},
  error::ApiError,
  response,
};

pub async fn stats<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator, Role::Veterinarian])?;

  let records = state.rel.counts().await.map_err(store_err)?;
  let catalog = state.doc.counts().await.map_err(store_err)?;

  Ok(response::ok(json!({
    "users":        records.users,
    "owners":       records.owners,
    "pets":         records.pets,
    "orders":       records.orders,
    "appointments": records.appointments,
    "products":     catalog.products,
    "services":     catalog.services,
  })))
}
