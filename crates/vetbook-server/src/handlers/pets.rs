//! `/api/pets` — pet CRUD plus the medical-history companion document.
//!
//! Creating a pet is a dual write: the row first, then an empty medical
//! history document, best-effort. Medical record and vaccination appends
//! are role-gated to clinical staff and stamp the acting veterinarian's id
//! from the verified principal, never from the request body.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  document::{MedicalHistory, MedicalRecord, Vaccination},
  record::{NewPet, PetPatch, Role},
  store::{DocumentStore, PetFilter, RelationalStore},
};

use super::{page_of, seal, store_err};
use crate::{
  AppState,
  auth::{Principal, require_role},
  compose,
  error::ApiError,
  response::{self, Paged, Pagination},
  validate::Violations,
};

const DEFAULT_HEALTH: &str = "Healthy";

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:     Option<u32>,
  pub limit:    Option<u32>,
  pub search:   Option<String>,
  pub owner_id: Option<i64>,
}

/// `GET /api/pets`
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
  let (rows, total) = state
    .rel
    .list_pets(PetFilter { owner_id: params.owner_id }, page)
    .await
    .map_err(store_err)?;

  let mut items: Vec<_> = rows
    .iter()
    .map(|(pet, owner)| compose::pet(&state.cipher, pet, owner.as_ref()))
    .collect();

  if let Some(term) = params.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
    let needle = term.to_lowercase();
    items.retain(|view| compose::pet_matches(view, &needle));
  }

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:          Option<String>,
  pub breed:         Option<String>,
  pub age:           Option<i64>,
  pub owner_id:      Option<i64>,
  pub health_status: Option<String>,
}

/// `POST /api/pets`
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
  if let Some(age) = body.age
    && age < 0
  {
    violations.add("age", "must not be negative");
  }
  violations.finish()?;
  let name = name.unwrap_or_default();

  let owner = match body.owner_id {
    Some(owner_id) => Some(
      state
        .rel
        .get_owner(owner_id)
        .await
        .map_err(store_err)?
        .ok_or(ApiError::OwnerNotFound(owner_id))?,
    ),
    None => None,
  };

  let pet = state
    .rel
    .add_pet(NewPet {
      encrypted_name: seal(&state.cipher, name)?,
      breed: body.breed,
      age: body.age,
      owner_id: body.owner_id,
      health_status: body.health_status.unwrap_or_else(|| DEFAULT_HEALTH.into()),
    })
    .await
    .map_err(store_err)?;

  // Companion document; best-effort after the row committed.
  if let Err(e) = state.doc.put_medical_history(MedicalHistory::empty(pet.id)).await {
    tracing::warn!(pet = pet.id, error = %e, "medical history write failed");
  }

  tracing::info!(pet = pet.id, by = principal.id, "pet created");
  Ok(response::created(compose::pet(&state.cipher, &pet, owner.as_ref())))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub name:          Option<String>,
  pub breed:         Option<String>,
  pub age:           Option<i64>,
  pub owner_id:      Option<i64>,
  pub health_status: Option<String>,
}

/// `PUT /api/pets/{id}`
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
  if let Some(age) = body.age
    && age < 0
  {
    return Err(ApiError::Validation(vec![
      json!({ "field": "age", "message": "must not be negative" }),
    ]));
  }
  if let Some(owner_id) = body.owner_id
    && state.rel.get_owner(owner_id).await.map_err(store_err)?.is_none()
  {
    return Err(ApiError::OwnerNotFound(owner_id));
  }

  let mut patch = PetPatch {
    breed: body.breed,
    age: body.age,
    owner_id: body.owner_id,
    health_status: body.health_status,
    ..Default::default()
  };
  if let Some(name) = body.name.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    patch.encrypted_name = Some(seal(&state.cipher, name)?);
  }

  let pet = state
    .rel
    .update_pet(id, patch)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::PetNotFound(id))?;

  let owner = match pet.owner_id {
    Some(owner_id) => state.rel.get_owner(owner_id).await.map_err(store_err)?,
    None => None,
  };

  tracing::info!(pet = id, by = principal.id, "pet updated");
  Ok(response::ok_message(
    compose::pet(&state.cipher, &pet, owner.as_ref()),
    "pet updated",
  ))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /api/pets/{id}` — row first, then best-effort document delete.
pub async fn remove<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  if !state.rel.delete_pet(id).await.map_err(store_err)? {
    return Err(ApiError::PetNotFound(id));
  }

  // The user-visible delete succeeded when the row went; a failing
  // document delete is logged, not surfaced.
  if let Err(e) = state.doc.delete_medical_history(id).await {
    tracing::warn!(pet = id, error = %e, "medical history delete failed");
  }

  tracing::info!(pet = id, by = principal.id, "pet deleted");
  Ok(response::ok_message(json!({ "id": id }), "pet deleted"))
}

// ─── Medical history ─────────────────────────────────────────────────────────

/// `GET /api/pets/{id}/medical-history` — absent documents compose to the
/// default empty shape.
pub async fn medical_history<R, D>(
  _principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  if state.rel.get_pet(id).await.map_err(store_err)?.is_none() {
    return Err(ApiError::PetNotFound(id));
  }

  let history = state
    .doc
    .get_medical_history(id)
    .await
    .map_err(store_err)?
    .unwrap_or_else(|| MedicalHistory::empty(id));

  Ok(response::ok(history))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub date:         Option<DateTime<Utc>>,
  pub diagnosis:    Option<String>,
  pub treatment:    Option<String>,
  pub observations: Option<String>,
}

/// `POST /api/pets/{id}/medical-history` — clinical staff only.
pub async fn add_medical_record<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
  Json(body): Json<RecordBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator, Role::Veterinarian])?;

  let mut violations = Violations::new();
  let diagnosis = violations.require_str("diagnosis", body.diagnosis.as_deref());
  let treatment = violations.require_str("treatment", body.treatment.as_deref());
  violations.finish()?;

  if state.rel.get_pet(id).await.map_err(store_err)?.is_none() {
    return Err(ApiError::PetNotFound(id));
  }

  let history = state
    .doc
    .add_medical_record(id, MedicalRecord {
      date:            body.date.unwrap_or_else(Utc::now),
      diagnosis:       diagnosis.unwrap_or_default().to_owned(),
      treatment:       treatment.unwrap_or_default().to_owned(),
      observations:    body.observations.unwrap_or_default(),
      veterinarian_id: principal.id,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(pet = id, by = principal.id, "medical record added");
  Ok(response::created(history))
}

#[derive(Debug, Deserialize)]
pub struct VaccinationBody {
  pub name:     Option<String>,
  pub date:     Option<DateTime<Utc>>,
  pub next_due: Option<DateTime<Utc>>,
}

/// `POST /api/pets/{id}/vaccinations` — clinical staff only.
pub async fn add_vaccination<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
  Json(body): Json<VaccinationBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  require_role(&principal, &[Role::Administrator, Role::Veterinarian])?;

  let mut violations = Violations::new();
  let name = violations.require_str("name", body.name.as_deref());
  violations.finish()?;

  if state.rel.get_pet(id).await.map_err(store_err)?.is_none() {
    return Err(ApiError::PetNotFound(id));
  }

  let history = state
    .doc
    .add_vaccination(id, Vaccination {
      name:            name.unwrap_or_default().to_owned(),
      date:            body.date.unwrap_or_else(Utc::now),
      next_due:        body.next_due,
      veterinarian_id: principal.id,
    })
    .await
    .map_err(store_err)?;

  tracing::info!(pet = id, by = principal.id, "vaccination added");
  Ok(response::created(history))
}
