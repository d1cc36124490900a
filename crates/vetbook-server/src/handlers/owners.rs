//! `/api/owners` — relational-backed CRUD for clinic clients.
//!
//! All three personal fields are encrypted at rest, so the `search`
//! parameter filters the decrypted page in memory (the page can come back
//! short) and duplicate-email checks go through the search token.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  record::{NewOwner, OwnerPatch},
  store::{DocumentStore, OwnerDelete, RelationalStore},
};

use super::{page_of, seal, store_err};
use crate::{
  AppState,
  auth::Principal,
  compose,
  error::ApiError,
  response::{self, Paged, Pagination},
  validate::{Violations, looks_like_email},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub search: Option<String>,
}

/// `GET /api/owners`
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
  let (rows, total) = state.rel.list_owners(page).await.map_err(store_err)?;

  let mut items: Vec<_> =
    rows.iter().map(|row| compose::owner(&state.cipher, row)).collect();

  // Post-decryption scan over the fetched page only.
  if let Some(term) = params.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let needle = term.to_lowercase();
    items.retain(|view| compose::owner_matches(view, &needle));
  }

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:  Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

/// `POST /api/owners`
pub async fn create<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Json(body): Json<CreateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let mut violations = Violations::new();
  let name = violations.require_str("name", body.name.as_deref());
  let email = violations.require_str("email", body.email.as_deref());
  if let Some(email) = email
    && !looks_like_email(email)
  {
    violations.add("email", "is not a valid email address");
  }
  let phone = violations.require_str("phone", body.phone.as_deref());
  violations.finish()?;
  let (name, email, phone) =
    (name.unwrap_or_default(), email.unwrap_or_default(), phone.unwrap_or_default());

  let email_token = state.cipher.search_token(email);
  if state
    .rel
    .find_owner_by_email(&email_token)
    .await
    .map_err(store_err)?
    .is_some()
  {
    return Err(ApiError::EmailExists);
  }

  let owner = state
    .rel
    .add_owner(NewOwner {
      encrypted_name: seal(&state.cipher, name)?,
      encrypted_email: seal(&state.cipher, email)?,
      encrypted_phone: seal(&state.cipher, phone)?,
      email_token,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(owner = owner.id, by = principal.id, "owner created");
  Ok(response::created(compose::owner(&state.cipher, &owner)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:  Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

/// `PUT /api/owners/{id}` — merge-patch; only supplied fields change.
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
  let mut patch = OwnerPatch::default();

  if let Some(name) = body.name.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    patch.encrypted_name = Some(seal(&state.cipher, name)?);
  }
  if let Some(email) = body.email.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    if !looks_like_email(email) {
      return Err(ApiError::Validation(vec![
        json!({ "field": "email", "message": "is not a valid email address" }),
      ]));
    }
    let email_token = state.cipher.search_token(email);
    // The token is the only equality handle, so the duplicate check must
    // run here in the application layer.
    if let Some(other) = state
      .rel
      .find_owner_by_email(&email_token)
      .await
      .map_err(store_err)?
      && other.id != id
    {
      return Err(ApiError::EmailExists);
    }
    patch.encrypted_email = Some(seal(&state.cipher, email)?);
    patch.email_token = Some(email_token);
  }
  if let Some(phone) = body.phone.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    patch.encrypted_phone = Some(seal(&state.cipher, phone)?);
  }

  let owner = state
    .rel
    .update_owner(id, patch)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::OwnerNotFound(id))?;

  tracing::info!(owner = id, by = principal.id, "owner updated");
  Ok(response::ok_message(
    compose::owner(&state.cipher, &owner),
    "owner updated",
  ))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/owners/{id}` — blocked while pets reference the owner.
pub async fn remove<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  match state.rel.delete_owner(id).await.map_err(store_err)? {
    OwnerDelete::Deleted => {
      tracing::info!(owner = id, by = principal.id, "owner deleted");
      Ok(response::ok_message(json!({ "id": id }), "owner deleted"))
    }
    OwnerDelete::NotFound => Err(ApiError::OwnerNotFound(id)),
    OwnerDelete::HasPets => Err(ApiError::OwnerHasPets(id)),
  }
}

// ─── Pets of one owner ───────────────────────────────────────────────────────

/// `GET /api/owners/{id}/pets`
pub async fn pets<R, D>(
  _principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let owner = state
    .rel
    .get_owner(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::OwnerNotFound(id))?;

  let rows = state.rel.pets_of_owner(id).await.map_err(store_err)?;
  let items: Vec<_> = rows
    .iter()
    .map(|row| compose::pet(&state.cipher, row, Some(&owner)))
    .collect();

  Ok(response::ok(items))
}
