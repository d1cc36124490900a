//! Relational aggregate rows: Owner, Pet, User, Order, Appointment.
//!
//! These own identity, foreign keys, enums, money and timestamps. The
//! variable-shape remainder of each aggregate lives in a companion document
//! (see [`crate::document`]) keyed by the row's integer id. Protected
//! personal fields are stored as ciphertext produced by the field cipher and
//! are only ever decrypted at the composition boundary; the `encrypted_*`
//! naming marks them. `email_token` is the keyed deterministic token used
//! for equality lookups over an otherwise non-searchable ciphertext column.
//!
//! Money is integer cents throughout; no floating point touches a price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Clinic staff roles, in decreasing order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Administrator,
  Veterinarian,
  Receptionist,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Administrator => "administrator",
      Role::Veterinarian => "veterinarian",
      Role::Receptionist => "receptionist",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "administrator" => Ok(Role::Administrator),
      "veterinarian" => Ok(Role::Veterinarian),
      "receptionist" => Ok(Role::Receptionist),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Paid,
  Pending,
  Unpaid,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Paid => "paid",
      PaymentStatus::Pending => "pending",
      PaymentStatus::Unpaid => "unpaid",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "paid" => Ok(PaymentStatus::Paid),
      "pending" => Ok(PaymentStatus::Pending),
      "unpaid" => Ok(PaymentStatus::Unpaid),
      other => Err(Error::UnknownPaymentStatus(other.to_owned())),
    }
  }
}

/// Fulfillment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
  Fulfilled,
  InProgress,
  Unfulfilled,
}

impl FulfillmentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      FulfillmentStatus::Fulfilled => "fulfilled",
      FulfillmentStatus::InProgress => "in_progress",
      FulfillmentStatus::Unfulfilled => "unfulfilled",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "fulfilled" => Ok(FulfillmentStatus::Fulfilled),
      "in_progress" => Ok(FulfillmentStatus::InProgress),
      "unfulfilled" => Ok(FulfillmentStatus::Unfulfilled),
      other => Err(Error::UnknownFulfillmentStatus(other.to_owned())),
    }
  }
}

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
  Pending,
  Completed,
  Cancelled,
}

impl AppointmentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      AppointmentStatus::Pending => "pending",
      AppointmentStatus::Completed => "completed",
      AppointmentStatus::Cancelled => "cancelled",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "pending" => Ok(AppointmentStatus::Pending),
      "completed" => Ok(AppointmentStatus::Completed),
      "cancelled" => Ok(AppointmentStatus::Cancelled),
      other => Err(Error::UnknownAppointmentStatus(other.to_owned())),
    }
  }
}

/// Payment state of an appointment. Narrower than [`PaymentStatus`]:
/// appointments are never part-billed, so there is no `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentPayment {
  Paid,
  Unpaid,
}

impl AppointmentPayment {
  pub fn as_str(&self) -> &'static str {
    match self {
      AppointmentPayment::Paid => "paid",
      AppointmentPayment::Unpaid => "unpaid",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "paid" => Ok(AppointmentPayment::Paid),
      "unpaid" => Ok(AppointmentPayment::Unpaid),
      other => Err(Error::UnknownPaymentStatus(other.to_owned())),
    }
  }
}

// ─── Owner ───────────────────────────────────────────────────────────────────

/// A pet owner (clinic client). Name, email and phone are ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
  pub id:              i64,
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub encrypted_phone: String,
  pub email_token:     String,
  pub created_at:      DateTime<Utc>,
}

/// Input for creating an owner. Fields arrive already encrypted; the token
/// is derived from the plaintext email before encryption.
#[derive(Debug, Clone)]
pub struct NewOwner {
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub encrypted_phone: String,
  pub email_token:     String,
}

/// Merge-patch for an owner: only `Some` fields change. A new email always
/// travels with its recomputed token.
#[derive(Debug, Clone, Default)]
pub struct OwnerPatch {
  pub encrypted_name:  Option<String>,
  pub encrypted_email: Option<String>,
  pub encrypted_phone: Option<String>,
  pub email_token:     Option<String>,
}

impl OwnerPatch {
  pub fn is_empty(&self) -> bool {
    self.encrypted_name.is_none()
      && self.encrypted_email.is_none()
      && self.encrypted_phone.is_none()
  }
}

// ─── Pet ─────────────────────────────────────────────────────────────────────

/// A patient. Only the name is protected; breed and health status are
/// working data the whole clinic reads constantly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
  pub id:             i64,
  pub encrypted_name: String,
  pub breed:          Option<String>,
  pub age:            Option<i64>,
  pub owner_id:       Option<i64>,
  pub health_status:  String,
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPet {
  pub encrypted_name: String,
  pub breed:          Option<String>,
  pub age:            Option<i64>,
  pub owner_id:       Option<i64>,
  pub health_status:  String,
}

#[derive(Debug, Clone, Default)]
pub struct PetPatch {
  pub encrypted_name: Option<String>,
  pub breed:          Option<String>,
  pub age:            Option<i64>,
  pub owner_id:       Option<i64>,
  pub health_status:  Option<String>,
}

impl PetPatch {
  pub fn is_empty(&self) -> bool {
    self.encrypted_name.is_none()
      && self.breed.is_none()
      && self.age.is_none()
      && self.owner_id.is_none()
      && self.health_status.is_none()
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A staff account. The password hash is one-way (argon2 PHC string) and is
/// never decrypted or returned; email uniqueness is a logical check through
/// `email_token`, not a database constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:              i64,
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub email_token:     String,
  pub password_hash:   String,
  pub role:            Role,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub email_token:     String,
  pub password_hash:   String,
  pub role:            Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub encrypted_name:  Option<String>,
  pub encrypted_email: Option<String>,
  pub email_token:     Option<String>,
  pub password_hash:   Option<String>,
  pub role:            Option<Role>,
}

impl UserPatch {
  pub fn is_empty(&self) -> bool {
    self.encrypted_name.is_none()
      && self.encrypted_email.is_none()
      && self.password_hash.is_none()
      && self.role.is_none()
  }
}

// ─── Order ───────────────────────────────────────────────────────────────────

/// A product sale. The priced line items live in the companion
/// [`OrderDetails`](crate::document::OrderDetails) document; the row holds
/// the money and status fields the relational transaction must keep atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
  pub id:                 i64,
  pub client_id:          Option<i64>,
  pub total_cents:        i64,
  pub payment_status:     PaymentStatus,
  pub fulfillment_status: FulfillmentStatus,
  pub order_date:         DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
  pub client_id:          Option<i64>,
  pub total_cents:        i64,
  pub payment_status:     PaymentStatus,
  pub fulfillment_status: FulfillmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
  pub payment_status:     Option<PaymentStatus>,
  pub fulfillment_status: Option<FulfillmentStatus>,
}

impl OrderPatch {
  pub fn is_empty(&self) -> bool {
    self.payment_status.is_none() && self.fulfillment_status.is_none()
  }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

/// A clinic visit. Service snapshots, notes and clinical findings live in
/// the companion [`AppointmentDetails`](crate::document::AppointmentDetails)
/// document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
  pub id:               i64,
  pub client_id:        Option<i64>,
  pub pet_id:           Option<i64>,
  pub appointment_date: DateTime<Utc>,
  pub status:           AppointmentStatus,
  pub total_cents:      i64,
  pub payment_status:   AppointmentPayment,
  pub created_at:       DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub client_id:        Option<i64>,
  pub pet_id:           Option<i64>,
  pub appointment_date: DateTime<Utc>,
  pub status:           AppointmentStatus,
  pub total_cents:      i64,
  pub payment_status:   AppointmentPayment,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentPatch {
  pub appointment_date: Option<DateTime<Utc>>,
  pub status:           Option<AppointmentStatus>,
  pub payment_status:   Option<AppointmentPayment>,
}

impl AppointmentPatch {
  pub fn is_empty(&self) -> bool {
    self.appointment_date.is_none()
      && self.status.is_none()
      && self.payment_status.is_none()
  }
}
