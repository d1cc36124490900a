//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, enums as their snake_case `as_str` forms. The `Raw*`
//! structs carry column strings out of `query_map` closures; conversion to
//! domain types (and all parsing) happens outside the connection thread.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;
use vetbook_core::record::{
  Appointment, AppointmentPayment, AppointmentStatus, FulfillmentStatus,
  Order, Owner, PaymentStatus, Pet, Role, User,
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Closure error bridging ──────────────────────────────────────────────────

/// Wrap a non-database error so it can cross a `Connection::call` boundary.
/// Used where a closure must parse JSON to stay a single atomic unit.
pub fn into_call_err<E>(e: E) -> tokio_rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `owners` row.
pub struct RawOwner {
  pub id:              i64,
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub encrypted_phone: String,
  pub email_token:     String,
  pub created_at:      String,
}

impl RawOwner {
  /// Read the six owner columns starting at `base`.
  pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(RawOwner {
      id:              row.get(base)?,
      encrypted_name:  row.get(base + 1)?,
      encrypted_email: row.get(base + 2)?,
      encrypted_phone: row.get(base + 3)?,
      email_token:     row.get(base + 4)?,
      created_at:      row.get(base + 5)?,
    })
  }

  /// Like [`RawOwner::read`] but for a LEFT JOIN: a NULL id means the
  /// joined row is absent.
  pub fn read_opt(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<Self>> {
    let id: Option<i64> = row.get(base)?;
    match id {
      Some(id) => Ok(Some(RawOwner {
        id,
        encrypted_name:  row.get(base + 1)?,
        encrypted_email: row.get(base + 2)?,
        encrypted_phone: row.get(base + 3)?,
        email_token:     row.get(base + 4)?,
        created_at:      row.get(base + 5)?,
      })),
      None => Ok(None),
    }
  }

  pub fn into_owner(self) -> Result<Owner> {
    Ok(Owner {
      id:              self.id,
      encrypted_name:  self.encrypted_name,
      encrypted_email: self.encrypted_email,
      encrypted_phone: self.encrypted_phone,
      email_token:     self.email_token,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `pets` row.
pub struct RawPet {
  pub id:             i64,
  pub encrypted_name: String,
  pub breed:          Option<String>,
  pub age:            Option<i64>,
  pub owner_id:       Option<i64>,
  pub health_status:  String,
  pub created_at:     String,
}

impl RawPet {
  pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(RawPet {
      id:             row.get(base)?,
      encrypted_name: row.get(base + 1)?,
      breed:          row.get(base + 2)?,
      age:            row.get(base + 3)?,
      owner_id:       row.get(base + 4)?,
      health_status:  row.get(base + 5)?,
      created_at:     row.get(base + 6)?,
    })
  }

  pub fn read_opt(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<Self>> {
    let id: Option<i64> = row.get(base)?;
    match id {
      Some(id) => Ok(Some(RawPet {
        id,
        encrypted_name: row.get(base + 1)?,
        breed:          row.get(base + 2)?,
        age:            row.get(base + 3)?,
        owner_id:       row.get(base + 4)?,
        health_status:  row.get(base + 5)?,
        created_at:     row.get(base + 6)?,
      })),
      None => Ok(None),
    }
  }

  pub fn into_pet(self) -> Result<Pet> {
    Ok(Pet {
      id:             self.id,
      encrypted_name: self.encrypted_name,
      breed:          self.breed,
      age:            self.age,
      owner_id:       self.owner_id,
      health_status:  self.health_status,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:              i64,
  pub encrypted_name:  String,
  pub encrypted_email: String,
  pub email_token:     String,
  pub password_hash:   String,
  pub role:            String,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawUser {
  pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(RawUser {
      id:              row.get(base)?,
      encrypted_name:  row.get(base + 1)?,
      encrypted_email: row.get(base + 2)?,
      email_token:     row.get(base + 3)?,
      password_hash:   row.get(base + 4)?,
      role:            row.get(base + 5)?,
      created_at:      row.get(base + 6)?,
      updated_at:      row.get(base + 7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:              self.id,
      encrypted_name:  self.encrypted_name,
      encrypted_email: self.encrypted_email,
      email_token:     self.email_token,
      password_hash:   self.password_hash,
      role:            Role::parse(&self.role)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `orders` row.
pub struct RawOrder {
  pub id:                 i64,
  pub client_id:          Option<i64>,
  pub total_cents:        i64,
  pub payment_status:     String,
  pub fulfillment_status: String,
  pub order_date:         String,
}

impl RawOrder {
  pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(RawOrder {
      id:                 row.get(base)?,
      client_id:          row.get(base + 1)?,
      total_cents:        row.get(base + 2)?,
      payment_status:     row.get(base + 3)?,
      fulfillment_status: row.get(base + 4)?,
      order_date:         row.get(base + 5)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      id:                 self.id,
      client_id:          self.client_id,
      total_cents:        self.total_cents,
      payment_status:     PaymentStatus::parse(&self.payment_status)?,
      fulfillment_status: FulfillmentStatus::parse(&self.fulfillment_status)?,
      order_date:         decode_dt(&self.order_date)?,
    })
  }
}

/// Raw strings read directly from an `appointments` row.
pub struct RawAppointment {
  pub id:               i64,
  pub client_id:        Option<i64>,
  pub pet_id:           Option<i64>,
  pub appointment_date: String,
  pub status:           String,
  pub total_cents:      i64,
  pub payment_status:   String,
  pub created_at:       String,
}

impl RawAppointment {
  pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(RawAppointment {
      id:               row.get(base)?,
      client_id:        row.get(base + 1)?,
      pet_id:           row.get(base + 2)?,
      appointment_date: row.get(base + 3)?,
      status:           row.get(base + 4)?,
      total_cents:      row.get(base + 5)?,
      payment_status:   row.get(base + 6)?,
      created_at:       row.get(base + 7)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      id:               self.id,
      client_id:        self.client_id,
      pet_id:           self.pet_id,
      appointment_date: decode_dt(&self.appointment_date)?,
      status:           AppointmentStatus::parse(&self.status)?,
      total_cents:      self.total_cents,
      payment_status:   AppointmentPayment::parse(&self.payment_status)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
