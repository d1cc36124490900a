//! The aggregate composer: joins a relational row with its companion
//! document into one externally-visible resource.
//!
//! This is the only place protected fields are decrypted. Everything below
//! this boundary (pricing, filtering, storage) handles ciphertext or
//! already-snapshotted values; everything above it (the wire) only ever
//! sees plaintext. An absent companion document is a normal case and
//! composes from the `empty` default shape, never an error — that rule is
//! what lets a row-only aggregate (a dual write whose second step failed)
//! degrade gracefully on every read path.
//!
//! Substring search over decrypted fields also lives here: it runs after
//! decryption, over an already-fetched page, so a searched page may come
//! back smaller than the requested limit. Accepted tradeoff of
//! non-deterministic ciphertext; see the match helpers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vetbook_cipher::FieldCipher;
use vetbook_core::{
  document::{
    AppointmentDetails, FollowUp, OrderDetails, OrderLine, ServiceLine,
  },
  record::{
    Appointment, AppointmentPayment, AppointmentStatus, FulfillmentStatus,
    Order, Owner, PaymentStatus, Pet, Role, User,
  },
};

// ─── External shapes ─────────────────────────────────────────────────────────

/// A decrypted owner, as clients see it.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerView {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub phone:      String,
  pub created_at: DateTime<Utc>,
}

/// The short owner reference embedded in pets, orders and appointments.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerRef {
  pub id:    i64,
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetRef {
  pub id:    i64,
  pub name:  String,
  pub breed: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PetView {
  pub id:            i64,
  pub name:          String,
  pub breed:         Option<String>,
  pub age:           Option<i64>,
  pub health_status: String,
  pub owner:         Option<OwnerRef>,
  pub created_at:    DateTime<Utc>,
}

/// A staff account, decrypted. The password hash never appears here.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An order joined with its companion document.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  pub id:                 i64,
  pub client:             Option<OwnerRef>,
  pub total_cents:        i64,
  pub payment_status:     PaymentStatus,
  pub fulfillment_status: FulfillmentStatus,
  pub order_date:         DateTime<Utc>,
  pub products:           Vec<OrderLine>,
  pub notes:              String,
  pub discount_cents:     i64,
  pub tax_cents:          i64,
}

/// An appointment joined with its companion document.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
  pub id:               i64,
  pub client:           Option<OwnerRef>,
  pub pet:              Option<PetRef>,
  pub appointment_date: DateTime<Utc>,
  pub status:           AppointmentStatus,
  pub total_cents:      i64,
  pub payment_status:   AppointmentPayment,
  pub created_at:       DateTime<Utc>,
  pub services:         Vec<ServiceLine>,
  pub notes:            String,
  pub diagnosis:        String,
  pub treatment:        String,
  pub follow_up:        FollowUp,
}

// ─── Composition ─────────────────────────────────────────────────────────────

pub fn owner(cipher: &FieldCipher, row: &Owner) -> OwnerView {
  OwnerView {
    id:         row.id,
    name:       cipher.decrypt(&row.encrypted_name),
    email:      cipher.decrypt(&row.encrypted_email),
    phone:      cipher.decrypt(&row.encrypted_phone),
    created_at: row.created_at,
  }
}

pub fn owner_ref(cipher: &FieldCipher, row: &Owner) -> OwnerRef {
  OwnerRef {
    id:    row.id,
    name:  cipher.decrypt(&row.encrypted_name),
    email: cipher.decrypt(&row.encrypted_email),
  }
}

pub fn pet_ref(cipher: &FieldCipher, row: &Pet) -> PetRef {
  PetRef {
    id:    row.id,
    name:  cipher.decrypt(&row.encrypted_name),
    breed: row.breed.clone(),
  }
}

pub fn pet(cipher: &FieldCipher, row: &Pet, parent: Option<&Owner>) -> PetView {
  PetView {
    id:            row.id,
    name:          cipher.decrypt(&row.encrypted_name),
    breed:         row.breed.clone(),
    age:           row.age,
    health_status: row.health_status.clone(),
    owner:         parent.map(|o| owner_ref(cipher, o)),
    created_at:    row.created_at,
  }
}

pub fn user(cipher: &FieldCipher, row: &User) -> UserView {
  UserView {
    id:         row.id,
    name:       cipher.decrypt(&row.encrypted_name),
    email:      cipher.decrypt(&row.encrypted_email),
    role:       row.role,
    created_at: row.created_at,
    updated_at: row.updated_at,
  }
}

/// Join an order row with its (possibly absent) companion document.
pub fn order(
  cipher: &FieldCipher,
  row: &Order,
  client: Option<&Owner>,
  details: Option<OrderDetails>,
) -> OrderView {
  let details = details.unwrap_or_else(|| OrderDetails::empty(row.id));
  OrderView {
    id:                 row.id,
    client:             client.map(|o| owner_ref(cipher, o)),
    total_cents:        row.total_cents,
    payment_status:     row.payment_status,
    fulfillment_status: row.fulfillment_status,
    order_date:         row.order_date,
    products:           details.products,
    notes:              details.notes,
    discount_cents:     details.discount_cents,
    tax_cents:          details.tax_cents,
  }
}

/// Join an appointment row with its (possibly absent) companion document.
pub fn appointment(
  cipher: &FieldCipher,
  row: &Appointment,
  client: Option<&Owner>,
  patient: Option<&Pet>,
  details: Option<AppointmentDetails>,
) -> AppointmentView {
  let details = details.unwrap_or_else(|| AppointmentDetails::empty(row.id));
  AppointmentView {
    id:               row.id,
    client:           client.map(|o| owner_ref(cipher, o)),
    pet:              patient.map(|p| pet_ref(cipher, p)),
    appointment_date: row.appointment_date,
    status:           row.status,
    total_cents:      row.total_cents,
    payment_status:   row.payment_status,
    created_at:       row.created_at,
    services:         details.services,
    notes:            details.notes,
    diagnosis:        details.diagnosis,
    treatment:        details.treatment,
    follow_up:        details.follow_up,
  }
}

// ─── Post-decryption search ──────────────────────────────────────────────────

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(needle)
}

/// Case-insensitive substring match over an owner's decrypted fields.
/// `needle` must already be lowercased.
pub fn owner_matches(view: &OwnerView, needle: &str) -> bool {
  contains_ci(&view.name, needle)
    || contains_ci(&view.email, needle)
    || contains_ci(&view.phone, needle)
}

/// Case-insensitive substring match over a pet's decrypted name, breed and
/// owner name. `needle` must already be lowercased.
pub fn pet_matches(view: &PetView, needle: &str) -> bool {
  contains_ci(&view.name, needle)
    || view.breed.as_deref().is_some_and(|b| contains_ci(b, needle))
    || view.owner.as_ref().is_some_and(|o| contains_ci(&o.name, needle))
}

/// Case-insensitive substring match over a user's decrypted name and email.
/// `needle` must already be lowercased.
pub fn user_matches(view: &UserView, needle: &str) -> bool {
  contains_ci(&view.name, needle) || contains_ci(&view.email, needle)
}
