//! Bearer-token authentication and role guards.
//!
//! Tokens are HS256 JWTs carrying `{sub, email, role, iat, exp}` with a
//! 24-hour expiry. The [`Principal`] extractor runs before any handler
//! body, so core logic never sees an unauthenticated request: a missing
//! header is 401 `TOKEN_REQUIRED`, a failed verification 403
//! `INVALID_TOKEN`. Role gates are plain guard calls at the top of each
//! gated handler.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use vetbook_core::{
  record::{Role, User},
  store::{DocumentStore, RelationalStore},
};

use crate::{AppState, error::ApiError};

/// Token lifetime.
const TOKEN_HOURS: i64 = 24;

/// JWT claims. `sub` is the user's relational id; `email` is plaintext
/// (the token itself is the secret-bearing artifact, not the database).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub:   i64,
  pub email: String,
  pub role:  Role,
  pub iat:   i64,
  pub exp:   i64,
}

/// The verified caller attached to a request.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
  pub id:   i64,
  pub role: Role,
}

/// Issue a signed token for a freshly authenticated user.
pub fn issue_token(
  user: &User,
  email: &str,
  secret: &str,
) -> Result<String, ApiError> {
  let now = Utc::now();
  let claims = Claims {
    sub:   user.id,
    email: email.to_owned(),
    role:  user.role,
    iat:   now.timestamp(),
    exp:   (now + Duration::hours(TOKEN_HOURS)).timestamp(),
  };
  encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(secret.as_bytes()),
  )
  .map_err(|e| ApiError::Internal(Box::new(e)))
}

/// Reject the request unless the principal's role is in the allow-list.
pub fn require_role(
  principal: &Principal,
  allowed: &[Role],
) -> Result<(), ApiError> {
  if allowed.contains(&principal.role) {
    Ok(())
  } else {
    Err(ApiError::InsufficientPermissions)
  }
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(e.to_string().into()))
}

/// Check a password against a stored PHC string. Unparseable hashes count
/// as a mismatch, not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(stored_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

impl<R, D> FromRequestParts<AppState<R, D>> for Principal
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<R, D>,
  ) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::TokenRequired)?;

    let token = header.strip_prefix("Bearer ").ok_or(ApiError::TokenRequired)?;

    let data = decode::<Claims>(
      token,
      &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
      &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| ApiError::InvalidToken)?;

    Ok(Principal { id: data.claims.sub, role: data.claims.role })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2!").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2!", &hash));
    assert!(!verify_password("wrong", &hash));
  }

  #[test]
  fn garbage_hash_is_a_mismatch() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn role_guard() {
    let vet = Principal { id: 7, role: Role::Veterinarian };
    assert!(require_role(&vet, &[Role::Administrator, Role::Veterinarian]).is_ok());
    assert!(matches!(
      require_role(&vet, &[Role::Administrator]),
      Err(ApiError::InsufficientPermissions)
    ));
  }
}
