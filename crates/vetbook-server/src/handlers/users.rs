//! `/api/users` — staff account administration. Administrator only.
//!
//! The staff table stays small, so listing loads all rows, decrypts, then
//! filters and pages in memory — the one place the "load all, decrypt,
//! compare" pattern is exact rather than a page-scan approximation.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  record::{NewUser, Role, UserPatch},
  store::{DocumentStore, RelationalStore},
};

use super::{page_of, seal, store_err};
use crate::{
  AppState,
  auth::{Principal, hash_password, require_role},
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

/// `GET /api/users`
pub async fn list<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator])?;

  let page = page_of(params.page, params.limit);
  let rows = state.rel.list_users().await.map_err(store_err)?;

  let mut items: Vec<_> =
    rows.iter().map(|row| compose::user(&state.cipher, row)).collect();

  if let Some(term) = params.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let needle = term.to_lowercase();
    items.retain(|view| compose::user_matches(view, &needle));
  }

  let total = items.len() as u64;
  let items: Vec<_> = items
    .into_iter()
    .skip(page.offset() as usize)
    .take(page.limit as usize)
    .collect();

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  pub role:     Option<Role>,
}

/// `POST /api/users`
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
  let email = violations.require_str("email", body.email.as_deref());
  if let Some(email) = email
    && !looks_like_email(email)
  {
    violations.add("email", "is not a valid email address");
  }
  let password = violations.require_str("password", body.password.as_deref());
  if let Some(password) = password
    && password.len() < 6
  {
    violations.add("password", "must be at least 6 characters");
  }
  violations.finish()?;
  let (name, email, password) =
    (name.unwrap_or_default(), email.unwrap_or_default(), password.unwrap_or_default());

  let email_token = state.cipher.search_token(email);
  if state
    .rel
    .find_user_by_email(&email_token)
    .await
    .map_err(store_err)?
    .is_some()
  {
    return Err(ApiError::EmailExists);
  }

  let user = state
    .rel
    .add_user(NewUser {
      encrypted_name: seal(&state.cipher, name)?,
      encrypted_email: seal(&state.cipher, email)?,
      email_token,
      password_hash: hash_password(password)?,
      role: body.role.unwrap_or(Role::Receptionist),
    })
    .await
    .map_err(store_err)?;

  // Companion document; best-effort after the row committed.
  if let Err(e) = state
    .doc
    .record_activity(
      user.id,
      "created".into(),
      json!({ "by": principal.id }),
      Utc::now(),
      false,
    )
    .await
  {
    tracing::warn!(user = user.id, error = %e, "user details write failed");
  }

  tracing::info!(user = user.id, by = principal.id, "user created");
  Ok(response::created(compose::user(&state.cipher, &user)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  pub role:     Option<Role>,
}

/// `PUT /api/users/{id}`
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
  require_role(&principal, &[Role::Administrator])?;

  let mut patch = UserPatch { role: body.role, ..Default::default() };

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
    if let Some(other) = state
      .rel
      .find_user_by_email(&email_token)
      .await
      .map_err(store_err)?
      && other.id != id
    {
      return Err(ApiError::EmailExists);
    }
    patch.encrypted_email = Some(seal(&state.cipher, email)?);
    patch.email_token = Some(email_token);
  }
  if let Some(password) = body.password.as_deref().filter(|v| !v.is_empty()) {
    if password.len() < 6 {
      return Err(ApiError::Validation(vec![
        json!({ "field": "password", "message": "must be at least 6 characters" }),
      ]));
    }
    patch.password_hash = Some(hash_password(password)?);
  }

  let user = state
    .rel
    .update_user(id, patch)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::UserNotFound(id))?;

  tracing::info!(user = id, by = principal.id, "user updated");
  Ok(response::ok_message(compose::user(&state.cipher, &user), "user updated"))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/users/{id}` — a user cannot delete their own account.
pub async fn remove<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator])?;

  if principal.id == id {
    return Err(ApiError::CannotDeleteSelf);
  }
  if !state.rel.delete_user(id).await.map_err(store_err)? {
    return Err(ApiError::UserNotFound(id));
  }

  if let Err(e) = state.doc.delete_user_details(id).await {
    tracing::warn!(user = id, error = %e, "user details delete failed");
  }

  tracing::info!(user = id, by = principal.id, "user deleted");
  Ok(response::ok_message(json!({ "id": id }), "user deleted"))
}
