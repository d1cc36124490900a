//! `/api/auth` — registration and login.
//!
//! Both endpoints are public and answer `{token, user}`. Email lookups go
//! through the deterministic search token, never the ciphertext column.

use axum::{Json, extract::State, response::Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  record::{NewUser, Role, User},
  store::{DocumentStore, RelationalStore},
};

use super::{seal, store_err};
use crate::{
  AppState,
  auth::{hash_password, issue_token, verify_password},
  error::ApiError,
  response,
  validate::{Violations, looks_like_email},
};

fn auth_payload(token: String, user: &User, name: &str, email: &str) -> serde_json::Value {
  json!({
    "token": token,
    "user": {
      "id": user.id,
      "name": name,
      "email": email,
      "role": user.role,
    },
  })
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
  pub role:     Option<Role>,
}

/// `POST /api/auth/register`
pub async fn register<R, D>(
  State(state): State<AppState<R, D>>,
  Json(body): Json<RegisterBody>,
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
  let existing = state
    .rel
    .find_user_by_email(&email_token)
    .await
    .map_err(store_err)?;
  if existing.is_some() {
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
    .record_activity(user.id, "register".into(), json!({}), Utc::now(), false)
    .await
  {
    tracing::warn!(user = user.id, error = %e, "user details write failed");
  }

  tracing::info!(user = user.id, "user registered");
  let token = issue_token(&user, email, &state.config.jwt_secret)?;
  Ok(response::created(auth_payload(token, &user, name, email)))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// `POST /api/auth/login`
pub async fn login<R, D>(
  State(state): State<AppState<R, D>>,
  Json(body): Json<LoginBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let mut violations = Violations::new();
  let email = violations.require_str("email", body.email.as_deref());
  let password = violations.require_str("password", body.password.as_deref());
  violations.finish()?;
  let (email, password) = (email.unwrap_or_default(), password.unwrap_or_default());

  let user = state
    .rel
    .find_user_by_email(&state.cipher.search_token(email))
    .await
    .map_err(store_err)?
    .ok_or(ApiError::InvalidCredentials)?;

  if !verify_password(password, &user.password_hash) {
    return Err(ApiError::InvalidCredentials);
  }

  if let Err(e) = state
    .doc
    .record_activity(user.id, "login".into(), json!({}), Utc::now(), true)
    .await
  {
    tracing::warn!(user = user.id, error = %e, "login activity write failed");
  }

  tracing::info!(user = user.id, "user logged in");
  let name = state.cipher.decrypt(&user.encrypted_name);
  let token = issue_token(&user, email, &state.config.jwt_secret)?;
  Ok(response::ok(auth_payload(token, &user, &name, email)))
}
