//! `/api/services` — document-backed catalog CRUD for clinic services and
//! their priced subcategories.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use vetbook_core::{
  document::{NewService, ServicePatch, Subcategory},
  record::Role,
  store::{DocumentStore, RelationalStore, ServiceFilter},
};

use super::{page_of, store_err};
use crate::{
  AppState,
  auth::{Principal, require_role},
  error::ApiError,
  response::{self, Paged, Pagination},
  validate::Violations,
};

// ─── Subcategory bodies ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubcategoryBody {
  pub id:          Option<String>,
  pub name:        Option<String>,
  pub price_cents: Option<i64>,
}

/// Validate and materialise subcategory bodies; ids default to fresh UUIDs.
fn collect_subcategories(
  violations: &mut Violations,
  bodies: Vec<SubcategoryBody>,
) -> Vec<Subcategory> {
  let mut out = Vec::with_capacity(bodies.len());
  for (i, sub) in bodies.into_iter().enumerate() {
    let name = match sub.name.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
      Some(name) => name.to_owned(),
      None => {
        violations.add(&format!("subcategories[{i}].name"), "is required");
        continue;
      }
    };
    let price_cents = match sub.price_cents {
      Some(p) if p >= 0 => p,
      _ => {
        violations.add(
          &format!("subcategories[{i}].price_cents"),
          "must be a non-negative amount",
        );
        continue;
      }
    };
    out.push(Subcategory {
      id: sub.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
      name,
      price_cents,
    });
  }
  out
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub search: Option<String>,
  pub active: Option<bool>,
}

/// `GET /api/services`
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
  let filter = ServiceFilter { search: params.search, active: params.active };
  let (items, total) =
    state.doc.list_services(filter, page).await.map_err(store_err)?;

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:          Option<String>,
  pub description:   Option<String>,
  pub image:         Option<String>,
  #[serde(default)]
  pub subcategories: Vec<SubcategoryBody>,
  pub active:        Option<bool>,
}

/// `POST /api/services` — admin only.
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
  let subcategories = collect_subcategories(&mut violations, body.subcategories);
  violations.finish()?;

  let service = state
    .doc
    .add_service(NewService {
      name: name.unwrap_or_default().to_owned(),
      description: body.description.unwrap_or_default(),
      image: body.image,
      subcategories,
      active: body.active.unwrap_or(true),
    })
    .await
    .map_err(store_err)?;

  tracing::info!(service = %service.id, by = principal.id, "service created");
  Ok(response::created(service))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:          Option<String>,
  pub description:   Option<String>,
  pub image:         Option<String>,
  pub subcategories: Option<Vec<SubcategoryBody>>,
  pub active:        Option<bool>,
}

/// `PUT /api/services/{id}` — admin only. Supplying `subcategories`
/// replaces the whole list.
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
  let subcategories = body
    .subcategories
    .map(|bodies| collect_subcategories(&mut violations, bodies));
  violations.finish()?;

  let service = state
    .doc
    .update_service(id, ServicePatch {
      name: body.name,
      description: body.description,
      image: body.image,
      subcategories,
      active: body.active,
    })
    .await
    .map_err(store_err)?
    .ok_or(ApiError::ServiceNotFound(id))?;

  tracing::info!(service = %id, by = principal.id, "service updated");
  Ok(response::ok_message(service, "service updated"))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/services/{id}` — admin only.
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

  if !state.doc.delete_service(id).await.map_err(store_err)? {
    return Err(ApiError::ServiceNotFound(id));
  }

  tracing::info!(service = %id, by = principal.id, "service deleted");
  Ok(response::ok_message(json!({ "id": id }), "service deleted"))
}
