//! HTTP layer for the vetbook clinic backend.
//!
//! Exposes an axum [`Router`] over any [`RelationalStore`] +
//! [`DocumentStore`] pair. The two stores are independent by design; every
//! cross-store contract (dual writes, companion-document defaults, the
//! stock-reservation gap) is enforced here in the handlers, not in
//! storage.

pub mod auth;
pub mod compose;
pub mod error;
pub mod handlers;
pub mod pricing;
pub mod response;
pub mod validate;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use vetbook_cipher::FieldCipher;
use vetbook_core::store::{DocumentStore, RelationalStore};

use handlers::{
  appointments, auth as auth_handlers, orders, owners, pets, products,
  services, stats, users,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and/or
/// `VETBOOK_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  /// Path of the relational database file.
  pub relational_db: PathBuf,
  /// Path of the document database file.
  pub documents_db:  PathBuf,
  /// HS256 signing secret for bearer tokens.
  pub jwt_secret:    String,
  /// Secret the field cipher derives its keys from.
  pub field_secret:  String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers: the two store handles, the
/// field cipher and the configuration. Built once at startup and injected;
/// nothing here is a process global.
pub struct AppState<R, D> {
  pub rel:    Arc<R>,
  pub doc:    Arc<D>,
  pub cipher: Arc<FieldCipher>,
  pub config: Arc<ServerConfig>,
}

// Manual impl: `R`/`D` need no `Clone` of their own behind the `Arc`s.
impl<R, D> Clone for AppState<R, D> {
  fn clone(&self) -> Self {
    AppState {
      rel:    Arc::clone(&self.rel),
      doc:    Arc::clone(&self.doc),
      cipher: Arc::clone(&self.cipher),
      config: Arc::clone(&self.config),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full `/api` router.
pub fn router<R, D>(state: AppState<R, D>) -> Router
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  Router::new()
    // Auth (public)
    .route("/api/auth/register", post(auth_handlers::register::<R, D>))
    .route("/api/auth/login", post(auth_handlers::login::<R, D>))
    // Owners
    .route(
      "/api/owners",
      get(owners::list::<R, D>).post(owners::create::<R, D>),
    )
    .route(
      "/api/owners/{id}",
      put(owners::update::<R, D>).delete(owners::remove::<R, D>),
    )
    .route("/api/owners/{id}/pets", get(owners::pets::<R, D>))
    // Pets
    .route("/api/pets", get(pets::list::<R, D>).post(pets::create::<R, D>))
    .route(
      "/api/pets/{id}",
      put(pets::update::<R, D>).delete(pets::remove::<R, D>),
    )
    .route(
      "/api/pets/{id}/medical-history",
      get(pets::medical_history::<R, D>).post(pets::add_medical_record::<R, D>),
    )
    .route("/api/pets/{id}/vaccinations", post(pets::add_vaccination::<R, D>))
    // Users (admin)
    .route("/api/users", get(users::list::<R, D>).post(users::create::<R, D>))
    .route(
      "/api/users/{id}",
      put(users::update::<R, D>).delete(users::remove::<R, D>),
    )
    // Products
    .route(
      "/api/products",
      get(products::list::<R, D>).post(products::create::<R, D>),
    )
    .route(
      "/api/products/{id}",
      put(products::update::<R, D>).delete(products::remove::<R, D>),
    )
    .route("/api/products/{id}/stock", patch(products::adjust_stock::<R, D>))
    // Services
    .route(
      "/api/services",
      get(services::list::<R, D>).post(services::create::<R, D>),
    )
    .route(
      "/api/services/{id}",
      put(services::update::<R, D>).delete(services::remove::<R, D>),
    )
    // Orders (dual-store)
    .route(
      "/api/orders",
      get(orders::list::<R, D>).post(orders::create::<R, D>),
    )
    .route("/api/orders/{id}", put(orders::update::<R, D>))
    .route("/api/orders/{id}/details", get(orders::details::<R, D>))
    // Appointments (dual-store)
    .route(
      "/api/appointments",
      get(appointments::list::<R, D>).post(appointments::create::<R, D>),
    )
    .route("/api/appointments/{id}", put(appointments::update::<R, D>))
    .route(
      "/api/appointments/{id}/details",
      get(appointments::details::<R, D>),
    )
    // Stats
    .route("/api/stats", get(stats::stats::<R, D>))
    .fallback(fallback)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Unknown routes answer in the same envelope as everything else.
async fn fallback() -> ApiError {
  ApiError::RouteNotFound
}

#[cfg(test)]
mod tests;
