//! The `RelationalStore` and `DocumentStore` traits and supporting types.
//!
//! The two traits are implemented by storage backends (e.g.
//! `vetbook-store-sqlite`) over two independently-transacted databases.
//! Higher layers depend on these abstractions, not on any concrete backend.
//! There is deliberately no cross-store operation here: every dual write is
//! orchestrated above the traits, and every cross-store invariant is an
//! application contract.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  document::{
    AppointmentDetails, AppointmentDetailsPatch, MedicalHistory,
    MedicalRecord, NewProduct, NewService, OrderDetails, OrderDetailsPatch,
    Product, ProductPatch, Service, ServicePatch, UserDetails, Vaccination,
  },
  record::{
    Appointment, AppointmentPatch, AppointmentStatus, FulfillmentStatus,
    NewAppointment, NewOrder, NewOwner, NewPet, NewUser, Order, OrderPatch,
    Owner, OwnerPatch, PaymentStatus, Pet, PetPatch, User, UserPatch,
  },
};

// ─── Paging and filters ──────────────────────────────────────────────────────

/// A page request. Pages are 1-based; `limit` is the requested page size.
#[derive(Debug, Clone, Copy)]
pub struct Page {
  pub page:  u32,
  pub limit: u32,
}

impl Page {
  pub fn new(page: u32, limit: u32) -> Self {
    Page { page: page.max(1), limit: limit.max(1) }
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
  }
}

impl Default for Page {
  fn default() -> Self {
    Page { page: 1, limit: 10 }
  }
}

/// Store-level filters for [`RelationalStore::list_pets`].
#[derive(Debug, Clone, Default)]
pub struct PetFilter {
  pub owner_id: Option<i64>,
}

/// Store-level filters for [`RelationalStore::list_orders`].
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub payment_status:     Option<PaymentStatus>,
  pub fulfillment_status: Option<FulfillmentStatus>,
}

/// Store-level filters for [`RelationalStore::list_appointments`].
/// `date_from`/`date_to` bound `appointment_date` as a half-open interval.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
  pub status:    Option<AppointmentStatus>,
  pub client_id: Option<i64>,
  pub date_from: Option<DateTime<Utc>>,
  pub date_to:   Option<DateTime<Utc>>,
}

/// Store-level filters for [`DocumentStore::list_products`]. These columns
/// are unencrypted, so substring predicates run in the store, unlike the
/// application-layer scan used for encrypted fields.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
  /// Case-insensitive substring over name, description and category.
  pub search:   Option<String>,
  /// Case-insensitive substring over category alone.
  pub category: Option<String>,
  pub active:   Option<bool>,
}

/// Store-level filters for [`DocumentStore::list_services`].
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
  pub search: Option<String>,
  pub active: Option<bool>,
}

// ─── Operation outcomes ──────────────────────────────────────────────────────

/// Result of an owner deletion attempt. Deletion is blocked while pets
/// still reference the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerDelete {
  Deleted,
  NotFound,
  HasPets,
}

/// Result of an atomic stock adjustment. The guard, the mutation and the
/// outcome classification happen in one store-side step; callers never
/// read-modify-write stock.
#[derive(Debug, Clone)]
pub enum StockAdjust {
  /// The product after the adjustment was applied.
  Adjusted(Product),
  NotFound,
  /// The guard refused the adjustment; stock is unchanged.
  Insufficient { name: String, stock: i64 },
}

/// Row counts over the relational side, for the stats endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCounts {
  pub users:        u64,
  pub owners:       u64,
  pub pets:         u64,
  pub orders:       u64,
  pub appointments: u64,
}

/// Document counts over the catalog side, for the stats endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogCounts {
  pub products: u64,
  pub services: u64,
}

// ─── Relational store ────────────────────────────────────────────────────────

/// Abstraction over the relational side: typed rows, foreign keys and
/// transactions for Owner, Pet, User, Order and Appointment.
///
/// List methods return `(page_rows, matching_total)` — the total counts
/// rows matching the filter, before paging — so callers can build
/// pagination envelopes without a second query. Update methods apply
/// merge-patch semantics and return the updated row, or `None` when the id
/// does not exist.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RelationalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Owners ────────────────────────────────────────────────────────────

  fn add_owner(
    &self,
    new: NewOwner,
  ) -> impl Future<Output = Result<Owner, Self::Error>> + Send + '_;

  fn get_owner(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Owner>, Self::Error>> + Send + '_;

  /// One page of owners, newest first, plus the total row count.
  fn list_owners(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<(Vec<Owner>, u64), Self::Error>> + Send + '_;

  fn update_owner(
    &self,
    id: i64,
    patch: OwnerPatch,
  ) -> impl Future<Output = Result<Option<Owner>, Self::Error>> + Send + '_;

  /// Delete an owner unless pets still reference it. The dependent check
  /// and the delete run in one transaction.
  fn delete_owner(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<OwnerDelete, Self::Error>> + Send + '_;

  /// Equality lookup through the deterministic email token.
  fn find_owner_by_email(
    &self,
    email_token: &str,
  ) -> impl Future<Output = Result<Option<Owner>, Self::Error>> + Send + '_;

  /// All pets referencing this owner, unpaged.
  fn pets_of_owner(
    &self,
    owner_id: i64,
  ) -> impl Future<Output = Result<Vec<Pet>, Self::Error>> + Send + '_;

  // ── Pets ──────────────────────────────────────────────────────────────

  fn add_pet(
    &self,
    new: NewPet,
  ) -> impl Future<Output = Result<Pet, Self::Error>> + Send + '_;

  fn get_pet(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Pet>, Self::Error>> + Send + '_;

  /// One page of pets with their owner row eagerly joined (when set).
  fn list_pets(
    &self,
    filter: PetFilter,
    page: Page,
  ) -> impl Future<Output = Result<(Vec<(Pet, Option<Owner>)>, u64), Self::Error>>
  + Send
  + '_;

  fn update_pet(
    &self,
    id: i64,
    patch: PetPatch,
  ) -> impl Future<Output = Result<Option<Pet>, Self::Error>> + Send + '_;

  /// Delete a pet row. Returns `false` if the id does not exist. The
  /// companion medical-history document is the orchestrator's problem.
  fn delete_pet(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn add_user(
    &self,
    new: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All users, unpaged (the staff table stays small).
  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn update_user(
    &self,
    id: i64,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn delete_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Equality lookup through the deterministic email token. Backs both
  /// login and the duplicate-email check.
  fn find_user_by_email(
    &self,
    email_token: &str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Orders ────────────────────────────────────────────────────────────

  /// Insert an order row in its own transaction. Pricing has already
  /// happened; the row is the relational half of the dual write.
  fn add_order(
    &self,
    new: NewOrder,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  fn get_order(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<(Order, Option<Owner>)>, Self::Error>>
  + Send
  + '_;

  /// One page of orders, newest first, with client rows eagerly joined.
  fn list_orders(
    &self,
    filter: OrderFilter,
    page: Page,
  ) -> impl Future<
    Output = Result<(Vec<(Order, Option<Owner>)>, u64), Self::Error>,
  > + Send
  + '_;

  fn update_order(
    &self,
    id: i64,
    patch: OrderPatch,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  // ── Appointments ──────────────────────────────────────────────────────

  fn add_appointment(
    &self,
    new: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  fn get_appointment(
    &self,
    id: i64,
  ) -> impl Future<
    Output = Result<Option<(Appointment, Option<Owner>, Option<Pet>)>, Self::Error>,
  > + Send
  + '_;

  /// One page of appointments, soonest first, with client and pet rows
  /// eagerly joined.
  fn list_appointments(
    &self,
    filter: AppointmentFilter,
    page: Page,
  ) -> impl Future<
    Output = Result<
      (Vec<(Appointment, Option<Owner>, Option<Pet>)>, u64),
      Self::Error,
    >,
  > + Send
  + '_;

  fn update_appointment(
    &self,
    id: i64,
    patch: AppointmentPatch,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  fn counts(
    &self,
  ) -> impl Future<Output = Result<RecordCounts, Self::Error>> + Send + '_;
}

// ─── Document store ──────────────────────────────────────────────────────────

/// Abstraction over the document side: the standalone catalog (products,
/// services) and the four companion-document collections keyed by a
/// relational id.
///
/// Merge methods follow the uniform upsert policy: patching a missing
/// document materialises the default shape first, then applies the patch.
/// `put_*` methods overwrite whole documents and back the create path of
/// the dual write.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Products ──────────────────────────────────────────────────────────

  fn add_product(
    &self,
    new: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  fn get_product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn list_products(
    &self,
    filter: ProductFilter,
    page: Page,
  ) -> impl Future<Output = Result<(Vec<Product>, u64), Self::Error>> + Send + '_;

  fn update_product(
    &self,
    id: Uuid,
    patch: ProductPatch,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn delete_product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Atomically add `delta` (negative to reserve) to a product's stock,
  /// guarded so stock never drops below zero. Check, mutation and outcome
  /// are one store-side statement; two concurrent reservations can never
  /// both pass the guard.
  fn adjust_stock(
    &self,
    id: Uuid,
    delta: i64,
  ) -> impl Future<Output = Result<StockAdjust, Self::Error>> + Send + '_;

  // ── Services ──────────────────────────────────────────────────────────

  fn add_service(
    &self,
    new: NewService,
  ) -> impl Future<Output = Result<Service, Self::Error>> + Send + '_;

  fn get_service(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Service>, Self::Error>> + Send + '_;

  fn list_services(
    &self,
    filter: ServiceFilter,
    page: Page,
  ) -> impl Future<Output = Result<(Vec<Service>, u64), Self::Error>> + Send + '_;

  fn update_service(
    &self,
    id: Uuid,
    patch: ServicePatch,
  ) -> impl Future<Output = Result<Option<Service>, Self::Error>> + Send + '_;

  fn delete_service(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Order details ─────────────────────────────────────────────────────

  fn put_order_details(
    &self,
    details: OrderDetails,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_order_details(
    &self,
    order_id: i64,
  ) -> impl Future<Output = Result<Option<OrderDetails>, Self::Error>> + Send + '_;

  fn merge_order_details(
    &self,
    order_id: i64,
    patch: OrderDetailsPatch,
  ) -> impl Future<Output = Result<OrderDetails, Self::Error>> + Send + '_;

  // ── Appointment details ───────────────────────────────────────────────

  fn put_appointment_details(
    &self,
    details: AppointmentDetails,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_appointment_details(
    &self,
    appointment_id: i64,
  ) -> impl Future<Output = Result<Option<AppointmentDetails>, Self::Error>>
  + Send
  + '_;

  fn merge_appointment_details(
    &self,
    appointment_id: i64,
    patch: AppointmentDetailsPatch,
  ) -> impl Future<Output = Result<AppointmentDetails, Self::Error>> + Send + '_;

  // ── Pet medical history ───────────────────────────────────────────────

  fn put_medical_history(
    &self,
    history: MedicalHistory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_medical_history(
    &self,
    pet_id: i64,
  ) -> impl Future<Output = Result<Option<MedicalHistory>, Self::Error>>
  + Send
  + '_;

  /// Append a consultation record, materialising the document if absent.
  fn add_medical_record(
    &self,
    pet_id: i64,
    record: MedicalRecord,
  ) -> impl Future<Output = Result<MedicalHistory, Self::Error>> + Send + '_;

  /// Append a vaccination, materialising the document if absent.
  fn add_vaccination(
    &self,
    pet_id: i64,
    vaccination: Vaccination,
  ) -> impl Future<Output = Result<MedicalHistory, Self::Error>> + Send + '_;

  fn delete_medical_history(
    &self,
    pet_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── User details ──────────────────────────────────────────────────────

  fn put_user_details(
    &self,
    details: UserDetails,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_user_details(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<UserDetails>, Self::Error>> + Send + '_;

  /// Append an activity entry, materialising the document if absent;
  /// optionally stamps `last_login` with the entry's timestamp.
  fn record_activity(
    &self,
    user_id: i64,
    action: String,
    details: serde_json::Value,
    at: DateTime<Utc>,
    set_last_login: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_user_details(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  fn counts(
    &self,
  ) -> impl Future<Output = Result<CatalogCounts, Self::Error>> + Send + '_;
}
