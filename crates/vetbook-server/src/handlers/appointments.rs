//! `/api/appointments` — dual-store CRUD for clinic visits.
//!
//! Same dual-write shape as orders, with service pricing instead of stock
//! reservation: parents validated, lines priced and snapshotted, row
//! inserted in its own transaction, companion document written
//! best-effort.

use axum::{
  Json,
  extract::{Path, Query, State},
  response::Response,
};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;
use vetbook_core::{
  document::{AppointmentDetails, AppointmentDetailsPatch, FollowUp},
  record::{
    AppointmentPatch, AppointmentPayment, AppointmentStatus, NewAppointment,
  },
  store::{AppointmentFilter, DocumentStore, RelationalStore},
};

use super::{page_of, store_err};
use crate::{
  AppState,
  auth::Principal,
  compose,
  error::ApiError,
  pricing::{self, ServiceLineRequest},
  response::{self, Paged, Pagination},
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
  pub status:    Option<AppointmentStatus>,
  pub client_id: Option<i64>,
  /// Civil day, `YYYY-MM-DD`; bounds `appointment_date` to `[00:00, +1d)`
  /// UTC.
  pub date:      Option<String>,
}

/// `GET /api/appointments`
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

  let (date_from, date_to) = match params.date.as_deref() {
    Some(raw) => {
      let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::Validation(vec![
          json!({ "field": "date", "message": "must be YYYY-MM-DD" }),
        ])
      })?;
      let start = day.and_time(NaiveTime::MIN).and_utc();
      let end = day
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc());
      (Some(start), end)
    }
    None => (None, None),
  };

  let filter = AppointmentFilter {
    status: params.status,
    client_id: params.client_id,
    date_from,
    date_to,
  };
  let (rows, total) =
    state.rel.list_appointments(filter, page).await.map_err(store_err)?;

  let mut items = Vec::with_capacity(rows.len());
  for (appointment, client, pet) in &rows {
    let details = state
      .doc
      .get_appointment_details(appointment.id)
      .await
      .map_err(store_err)?;
    items.push(compose::appointment(
      &state.cipher,
      appointment,
      client.as_ref(),
      pet.as_ref(),
      details,
    ));
  }

  Ok(response::ok(Paged { items, pagination: Pagination::new(total, page) }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub client_id:        Option<i64>,
  pub pet_id:           Option<i64>,
  pub appointment_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub services:         Vec<ServiceLineRequest>,
  pub notes:            Option<String>,
  pub payment_status:   Option<AppointmentPayment>,
}

/// `POST /api/appointments` — the dual write.
pub async fn create<R, D>(
  principal: Principal,
  State(state): State<AppState<R, D>>,
  Json(body): Json<CreateBody>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let appointment_date = body.appointment_date.ok_or_else(|| {
    ApiError::Validation(vec![
      json!({ "field": "appointment_date", "message": "is required" }),
    ])
  })?;

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
  let pet = match body.pet_id {
    Some(pet_id) => Some(
      state
        .rel
        .get_pet(pet_id)
        .await
        .map_err(store_err)?
        .ok_or(ApiError::PetNotFound(pet_id))?,
    ),
    None => None,
  };

  let (total_cents, lines) =
    pricing::price_services(&*state.doc, &body.services).await?;

  let appointment = state
    .rel
    .add_appointment(NewAppointment {
      client_id: body.client_id,
      pet_id: body.pet_id,
      appointment_date,
      status: AppointmentStatus::Pending,
      total_cents,
      payment_status: body.payment_status.unwrap_or(AppointmentPayment::Unpaid),
    })
    .await
    .map_err(store_err)?;

  // Companion document; best-effort after the row committed.
  let details = AppointmentDetails {
    appointment_id: appointment.id,
    services:       lines,
    notes:          body.notes.unwrap_or_default(),
    diagnosis:      String::new(),
    treatment:      String::new(),
    follow_up:      FollowUp::default(),
  };
  let details = match state.doc.put_appointment_details(details.clone()).await {
    Ok(()) => Some(details),
    Err(e) => {
      tracing::warn!(
        appointment = appointment.id,
        error = %e,
        "appointment details write failed"
      );
      None
    }
  };

  tracing::info!(appointment = appointment.id, by = principal.id, "appointment created");
  Ok(response::created(compose::appointment(
    &state.cipher,
    &appointment,
    client.as_ref(),
    pet.as_ref(),
    details,
  )))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub appointment_date: Option<DateTime<Utc>>,
  pub status:           Option<AppointmentStatus>,
  pub payment_status:   Option<AppointmentPayment>,
  pub notes:            Option<String>,
  pub diagnosis:        Option<String>,
  pub treatment:        Option<String>,
  pub follow_up:        Option<FollowUp>,
}

/// `PUT /api/appointments/{id}` — independent relational and document
/// patches; a document patch against a missing document upserts it.
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
  let patch = AppointmentPatch {
    appointment_date: body.appointment_date,
    status:           body.status,
    payment_status:   body.payment_status,
  };
  state
    .rel
    .update_appointment(id, patch)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::AppointmentNotFound(id))?;

  let doc_patch = AppointmentDetailsPatch {
    notes:     body.notes,
    diagnosis: body.diagnosis,
    treatment: body.treatment,
    follow_up: body.follow_up,
  };
  if !doc_patch.is_empty() {
    state
      .doc
      .merge_appointment_details(id, doc_patch)
      .await
      .map_err(store_err)?;
  }

  let (appointment, client, pet) = state
    .rel
    .get_appointment(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::AppointmentNotFound(id))?;
  let details =
    state.doc.get_appointment_details(id).await.map_err(store_err)?;

  tracing::info!(appointment = id, by = principal.id, "appointment updated");
  Ok(response::ok_message(
    compose::appointment(
      &state.cipher,
      &appointment,
      client.as_ref(),
      pet.as_ref(),
      details,
    ),
    "appointment updated",
  ))
}

// ─── Details ─────────────────────────────────────────────────────────────────

/// `GET /api/appointments/{id}/details`
pub async fn details<R, D>(
  _principal: Principal,
  State(state): State<AppState<R, D>>,
  Path(id): Path<i64>,
) -> Result<Response, ApiError>
where
  R: RelationalStore + 'static,
  D: DocumentStore + 'static,
{
  let (appointment, client, pet) = state
    .rel
    .get_appointment(id)
    .await
    .map_err(store_err)?
    .ok_or(ApiError::AppointmentNotFound(id))?;
  let details =
    state.doc.get_appointment_details(id).await.map_err(store_err)?;

  Ok(response::ok(compose::appointment(
    &state.cipher,
    &appointment,
    client.as_ref(),
    pet.as_ref(),
    details,
  )))
}
