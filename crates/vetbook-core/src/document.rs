//! Document-side aggregates: the product/service catalog and the companion
//! detail documents keyed by a relational row id.
//!
//! Companion documents are 1:1 with their row (unique on the key) but
//! nothing at the database level enforces the pairing — it is an
//! application contract, and a row may transiently exist without its
//! document when the second write of a dual write fails. Every reader
//! therefore composes an absent document from the `empty` constructors
//! below instead of treating it as an error.
//!
//! Line items store snapshots (name, unit price at sale time), not live
//! catalog references, so later catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// ─── Catalog: products ───────────────────────────────────────────────────────

/// A sellable product. `stock` never goes below zero; mutations go through
/// the store's atomic guarded adjustment, never read-modify-write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id:          Uuid,
  pub name:        String,
  pub description: String,
  pub price_cents: i64,
  pub stock:       i64,
  pub category:    String,
  pub image:       Option<String>,
  pub active:      bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name:        String,
  pub description: String,
  pub price_cents: i64,
  pub stock:       i64,
  pub category:    String,
  pub image:       Option<String>,
  pub active:      bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock:       Option<i64>,
  pub category:    Option<String>,
  pub image:       Option<String>,
  pub active:      Option<bool>,
}

// ─── Catalog: services ───────────────────────────────────────────────────────

/// A priced variant of a service ("consultation / first visit"). Ids are
/// caller-chosen short strings, only unique within their service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
  pub id:          String,
  pub name:        String,
  pub price_cents: i64,
}

/// A clinic service with zero or more priced subcategories. A service with
/// no subcategories is legal and prices at zero when booked without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
  pub id:            Uuid,
  pub name:          String,
  pub description:   String,
  pub image:         Option<String>,
  pub subcategories: Vec<Subcategory>,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
  pub name:          String,
  pub description:   String,
  pub image:         Option<String>,
  pub subcategories: Vec<Subcategory>,
  pub active:        bool,
}

#[derive(Debug, Clone, Default)]
pub struct ServicePatch {
  pub name:          Option<String>,
  pub description:   Option<String>,
  pub image:         Option<String>,
  pub subcategories: Option<Vec<Subcategory>>,
  pub active:        Option<bool>,
}

// ─── Order details ───────────────────────────────────────────────────────────

/// One priced product line, snapshotted at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
  pub product_id:  Uuid,
  pub name:        String,
  pub quantity:    i64,
  pub price_cents: i64,
}

/// Companion document of an [`Order`](crate::record::Order) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
  pub order_id:       i64,
  pub products:       Vec<OrderLine>,
  pub notes:          String,
  pub discount_cents: i64,
  pub tax_cents:      i64,
}

impl OrderDetails {
  /// The default shape every reader merges when the document is absent.
  pub fn empty(order_id: i64) -> Self {
    OrderDetails {
      order_id,
      products: Vec::new(),
      notes: String::new(),
      discount_cents: 0,
      tax_cents: 0,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct OrderDetailsPatch {
  pub notes: Option<String>,
}

impl OrderDetailsPatch {
  pub fn is_empty(&self) -> bool {
    self.notes.is_none()
  }
}

// ─── Appointment details ─────────────────────────────────────────────────────

/// One priced service line, snapshotted at booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLine {
  pub service_id:     Uuid,
  pub name:           String,
  pub price_cents:    i64,
  pub subcategory_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUp {
  pub required: bool,
  pub date:     Option<DateTime<Utc>>,
  pub notes:    String,
}

impl Default for FollowUp {
  fn default() -> Self {
    FollowUp { required: false, date: None, notes: String::new() }
  }
}

/// Companion document of an [`Appointment`](crate::record::Appointment) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetails {
  pub appointment_id: i64,
  pub services:       Vec<ServiceLine>,
  pub notes:          String,
  pub diagnosis:      String,
  pub treatment:      String,
  pub follow_up:      FollowUp,
}

impl AppointmentDetails {
  pub fn empty(appointment_id: i64) -> Self {
    AppointmentDetails {
      appointment_id,
      services: Vec::new(),
      notes: String::new(),
      diagnosis: String::new(),
      treatment: String::new(),
      follow_up: FollowUp::default(),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentDetailsPatch {
  pub notes:     Option<String>,
  pub diagnosis: Option<String>,
  pub treatment: Option<String>,
  pub follow_up: Option<FollowUp>,
}

impl AppointmentDetailsPatch {
  pub fn is_empty(&self) -> bool {
    self.notes.is_none()
      && self.diagnosis.is_none()
      && self.treatment.is_none()
      && self.follow_up.is_none()
  }
}

// ─── Pet medical history ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergySeverity {
  Mild,
  Moderate,
  Severe,
}

impl AllergySeverity {
  pub fn as_str(&self) -> &'static str {
    match self {
      AllergySeverity::Mild => "mild",
      AllergySeverity::Moderate => "moderate",
      AllergySeverity::Severe => "severe",
    }
  }

  pub fn parse(s: &str) -> Result<Self, Error> {
    match s {
      "mild" => Ok(AllergySeverity::Mild),
      "moderate" => Ok(AllergySeverity::Moderate),
      "severe" => Ok(AllergySeverity::Severe),
      other => Err(Error::UnknownAllergySeverity(other.to_owned())),
    }
  }
}

/// One consultation entry. `veterinarian_id` is the acting principal's id,
/// recorded by the handler, never taken from the request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
  pub date:            DateTime<Utc>,
  pub diagnosis:       String,
  pub treatment:       String,
  pub observations:    String,
  pub veterinarian_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vaccination {
  pub name:            String,
  pub date:            DateTime<Utc>,
  pub next_due:        Option<DateTime<Utc>>,
  pub veterinarian_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
  pub allergen: String,
  pub severity: AllergySeverity,
  pub notes:    String,
}

/// Companion document of a [`Pet`](crate::record::Pet) row. All three lists
/// are append-only in practice; entries are never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistory {
  pub pet_id:       i64,
  pub records:      Vec<MedicalRecord>,
  pub vaccinations: Vec<Vaccination>,
  pub allergies:    Vec<Allergy>,
}

impl MedicalHistory {
  pub fn empty(pet_id: i64) -> Self {
    MedicalHistory {
      pet_id,
      records: Vec::new(),
      vaccinations: Vec::new(),
      allergies: Vec::new(),
    }
  }
}

// ─── User details ────────────────────────────────────────────────────────────

/// One entry of a user's append-only activity trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub action:    String,
  pub timestamp: DateTime<Utc>,
  pub details:   serde_json::Value,
}

/// Companion document of a [`User`](crate::record::User) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
  pub user_id:      i64,
  pub image:        Option<String>,
  pub preferences:  serde_json::Value,
  pub last_login:   Option<DateTime<Utc>>,
  pub activity_log: Vec<ActivityEntry>,
}

impl UserDetails {
  pub fn empty(user_id: i64) -> Self {
    UserDetails {
      user_id,
      image: None,
      preferences: serde_json::Value::Object(serde_json::Map::new()),
      last_login: None,
      activity_log: Vec::new(),
    }
  }
}
