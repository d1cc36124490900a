//! Integration tests for the two stores against in-memory databases.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;
use vetbook_core::{
  document::{
    AppointmentDetailsPatch, FollowUp, MedicalRecord, NewProduct, NewService,
    OrderDetails, OrderDetailsPatch, OrderLine, ProductPatch, ServicePatch,
    Subcategory, Vaccination,
  },
  record::{
    AppointmentPatch, AppointmentPayment, AppointmentStatus,
    FulfillmentStatus, NewAppointment, NewOrder, NewOwner, NewPet, NewUser,
    OrderPatch, OwnerPatch, PaymentStatus, PetPatch, Role, UserPatch,
  },
  store::{
    AppointmentFilter, DocumentStore, OrderFilter, OwnerDelete, Page,
    PetFilter, ProductFilter, RelationalStore, ServiceFilter, StockAdjust,
  },
};

use crate::{SqliteDocumentStore, SqliteRelationalStore};

async fn rel() -> SqliteRelationalStore {
  SqliteRelationalStore::open_in_memory()
    .await
    .expect("in-memory relational store")
}

async fn docs() -> SqliteDocumentStore {
  SqliteDocumentStore::open_in_memory()
    .await
    .expect("in-memory document store")
}

// Ciphertext is opaque at this layer; tagged strings stand in for it.
fn owner(tag: &str) -> NewOwner {
  NewOwner {
    encrypted_name:  format!("enc:name:{tag}"),
    encrypted_email: format!("enc:email:{tag}"),
    encrypted_phone: format!("enc:phone:{tag}"),
    email_token:     format!("tok:{tag}"),
  }
}

fn pet(owner_id: Option<i64>, tag: &str) -> NewPet {
  NewPet {
    encrypted_name: format!("enc:pet:{tag}"),
    breed:          Some("beagle".into()),
    age:            Some(4),
    owner_id,
    health_status:  "Healthy".into(),
  }
}

fn staff(tag: &str, role: Role) -> NewUser {
  NewUser {
    encrypted_name:  format!("enc:name:{tag}"),
    encrypted_email: format!("enc:email:{tag}"),
    email_token:     format!("tok:{tag}"),
    password_hash:   "$argon2id$v=19$m=19456,t=2,p=1$stub$stub".into(),
    role,
  }
}

fn product(name: &str, category: &str, stock: i64) -> NewProduct {
  NewProduct {
    name:        name.into(),
    description: format!("{name} for dogs and cats"),
    price_cents: 1_250,
    stock,
    category:    category.into(),
    image:       None,
    active:      true,
  }
}

fn grooming() -> NewService {
  NewService {
    name:          "Grooming".into(),
    description:   "Full grooming session".into(),
    image:         None,
    subcategories: vec![
      Subcategory {
        id:          "short-hair".into(),
        name:        "Short hair".into(),
        price_cents: 2_000,
      },
      Subcategory {
        id:          "long-hair".into(),
        name:        "Long hair".into(),
        price_cents: 3_500,
      },
    ],
    active:        true,
  }
}

fn day(n: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, n, 10, 0, 0).unwrap()
}

fn booking(
  client_id: Option<i64>,
  pet_id: Option<i64>,
  date: DateTime<Utc>,
) -> NewAppointment {
  NewAppointment {
    client_id,
    pet_id,
    appointment_date: date,
    status: AppointmentStatus::Pending,
    total_cents: 2_000,
    payment_status: AppointmentPayment::Unpaid,
  }
}

// ─── Owners ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_owner() {
  let s = rel().await;

  let added = s.add_owner(owner("ana")).await.unwrap();
  assert_eq!(added.encrypted_name, "enc:name:ana");
  assert_eq!(added.email_token, "tok:ana");

  let fetched = s.get_owner(added.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, added.id);
  assert_eq!(fetched.encrypted_email, "enc:email:ana");
  assert_eq!(fetched.created_at, added.created_at);
}

#[tokio::test]
async fn get_owner_missing_returns_none() {
  let s = rel().await;
  assert!(s.get_owner(99).await.unwrap().is_none());
}

#[tokio::test]
async fn list_owners_pages_newest_first() {
  let s = rel().await;
  s.add_owner(owner("a")).await.unwrap();
  s.add_owner(owner("b")).await.unwrap();
  s.add_owner(owner("c")).await.unwrap();

  let (page1, total) = s.list_owners(Page::new(1, 2)).await.unwrap();
  assert_eq!(total, 3);
  assert_eq!(page1.len(), 2);
  assert_eq!(page1[0].email_token, "tok:c");
  assert_eq!(page1[1].email_token, "tok:b");

  let (page2, total) = s.list_owners(Page::new(2, 2)).await.unwrap();
  assert_eq!(total, 3);
  assert_eq!(page2.len(), 1);
  assert_eq!(page2[0].email_token, "tok:a");
}

#[tokio::test]
async fn update_owner_merges_fields() {
  let s = rel().await;
  let added = s.add_owner(owner("ana")).await.unwrap();

  let updated = s
    .update_owner(added.id, OwnerPatch {
      encrypted_name: Some("enc:name:ana-maria".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.encrypted_name, "enc:name:ana-maria");
  // untouched fields survive the merge
  assert_eq!(updated.encrypted_email, "enc:email:ana");
  assert_eq!(updated.email_token, "tok:ana");
}

#[tokio::test]
async fn update_owner_email_replaces_token() {
  let s = rel().await;
  let added = s.add_owner(owner("ana")).await.unwrap();

  s.update_owner(added.id, OwnerPatch {
    encrypted_email: Some("enc:email:new".into()),
    email_token: Some("tok:new".into()),
    ..Default::default()
  })
  .await
  .unwrap()
  .unwrap();

  assert!(s.find_owner_by_email("tok:ana").await.unwrap().is_none());
  let found = s.find_owner_by_email("tok:new").await.unwrap().unwrap();
  assert_eq!(found.id, added.id);
}

#[tokio::test]
async fn update_owner_missing_returns_none() {
  let s = rel().await;
  let result = s
    .update_owner(42, OwnerPatch {
      encrypted_name: Some("enc:name:nobody".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_owner_missing_is_not_found() {
  let s = rel().await;
  assert_eq!(s.delete_owner(7).await.unwrap(), OwnerDelete::NotFound);
}

#[tokio::test]
async fn delete_owner_removes_childless_row() {
  let s = rel().await;
  let added = s.add_owner(owner("ana")).await.unwrap();

  assert_eq!(s.delete_owner(added.id).await.unwrap(), OwnerDelete::Deleted);
  assert!(s.get_owner(added.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_owner_blocked_while_pets_reference_it() {
  let s = rel().await;
  let added = s.add_owner(owner("ana")).await.unwrap();
  s.add_pet(pet(Some(added.id), "rex")).await.unwrap();

  assert_eq!(s.delete_owner(added.id).await.unwrap(), OwnerDelete::HasPets);
  // the owner is untouched
  assert!(s.get_owner(added.id).await.unwrap().is_some());
}

#[tokio::test]
async fn find_owner_by_email_token() {
  let s = rel().await;
  s.add_owner(owner("ana")).await.unwrap();
  let bruno = s.add_owner(owner("bruno")).await.unwrap();

  let found = s.find_owner_by_email("tok:bruno").await.unwrap().unwrap();
  assert_eq!(found.id, bruno.id);
  assert!(s.find_owner_by_email("tok:nobody").await.unwrap().is_none());
}

// ─── Pets ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_pet_without_owner() {
  let s = rel().await;

  let stray = s
    .add_pet(NewPet {
      encrypted_name: "enc:pet:stray".into(),
      breed:          None,
      age:            None,
      owner_id:       None,
      health_status:  "In treatment".into(),
    })
    .await
    .unwrap();

  assert!(stray.owner_id.is_none());
  assert!(stray.breed.is_none());
  let fetched = s.get_pet(stray.id).await.unwrap().unwrap();
  assert_eq!(fetched.health_status, "In treatment");
}

#[tokio::test]
async fn pets_of_owner_is_scoped() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let bruno = s.add_owner(owner("bruno")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "mia")).await.unwrap();
  s.add_pet(pet(Some(bruno.id), "toby")).await.unwrap();

  let pets = s.pets_of_owner(ana.id).await.unwrap();
  assert_eq!(pets.len(), 2);
  assert!(pets.iter().all(|p| p.owner_id == Some(ana.id)));
}

#[tokio::test]
async fn list_pets_joins_owner_rows() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();
  s.add_pet(pet(None, "stray")).await.unwrap();

  let (rows, total) =
    s.list_pets(PetFilter::default(), Page::default()).await.unwrap();
  assert_eq!(total, 2);

  let with_owner = rows.iter().find(|(p, _)| p.owner_id.is_some()).unwrap();
  assert_eq!(with_owner.1.as_ref().unwrap().email_token, "tok:ana");
  let without = rows.iter().find(|(p, _)| p.owner_id.is_none()).unwrap();
  assert!(without.1.is_none());
}

#[tokio::test]
async fn list_pets_filtered_by_owner() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let bruno = s.add_owner(owner("bruno")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();
  s.add_pet(pet(Some(bruno.id), "toby")).await.unwrap();
  s.add_pet(pet(Some(bruno.id), "luna")).await.unwrap();

  let (rows, total) = s
    .list_pets(PetFilter { owner_id: Some(bruno.id) }, Page::default())
    .await
    .unwrap();
  assert_eq!(total, 2);
  assert!(rows.iter().all(|(p, _)| p.owner_id == Some(bruno.id)));
}

#[tokio::test]
async fn update_pet_reassigns_owner() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let bruno = s.add_owner(owner("bruno")).await.unwrap();
  let rex = s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();

  let updated = s
    .update_pet(rex.id, PetPatch {
      owner_id: Some(bruno.id),
      health_status: Some("Recovering".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.owner_id, Some(bruno.id));
  assert_eq!(updated.health_status, "Recovering");
  assert_eq!(updated.encrypted_name, "enc:pet:rex");
}

#[tokio::test]
async fn delete_pet_reports_existence() {
  let s = rel().await;
  let rex = s.add_pet(pet(None, "rex")).await.unwrap();

  assert!(s.delete_pet(rex.id).await.unwrap());
  assert!(!s.delete_pet(rex.id).await.unwrap());
  assert!(s.get_pet(rex.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_pet_clears_appointment_reference() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let rex = s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();
  let appt = s
    .add_appointment(booking(Some(ana.id), Some(rex.id), day(3)))
    .await
    .unwrap();

  assert!(s.delete_pet(rex.id).await.unwrap());

  let (row, client, pet_row) =
    s.get_appointment(appt.id).await.unwrap().unwrap();
  assert!(row.pet_id.is_none());
  assert!(pet_row.is_none());
  assert!(client.is_some());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_user_stamps_timestamps_together() {
  let s = rel().await;
  let vet = s.add_user(staff("vet", Role::Veterinarian)).await.unwrap();
  assert_eq!(vet.created_at, vet.updated_at);
  assert_eq!(vet.role, Role::Veterinarian);
}

#[tokio::test]
async fn update_user_bumps_updated_at() {
  let s = rel().await;
  let vet = s.add_user(staff("vet", Role::Veterinarian)).await.unwrap();

  let updated = s
    .update_user(vet.id, UserPatch {
      role: Some(Role::Administrator),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.role, Role::Administrator);
  assert_eq!(updated.created_at, vet.created_at);
  assert!(updated.updated_at >= vet.updated_at);
}

#[tokio::test]
async fn list_users_returns_all() {
  let s = rel().await;
  s.add_user(staff("admin", Role::Administrator)).await.unwrap();
  s.add_user(staff("vet", Role::Veterinarian)).await.unwrap();
  s.add_user(staff("desk", Role::Receptionist)).await.unwrap();

  let users = s.list_users().await.unwrap();
  assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn find_user_by_email_token() {
  let s = rel().await;
  s.add_user(staff("admin", Role::Administrator)).await.unwrap();
  let vet = s.add_user(staff("vet", Role::Veterinarian)).await.unwrap();

  let found = s.find_user_by_email("tok:vet").await.unwrap().unwrap();
  assert_eq!(found.id, vet.id);
  assert!(s.find_user_by_email("tok:ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn delete_user_reports_existence() {
  let s = rel().await;
  let vet = s.add_user(staff("vet", Role::Veterinarian)).await.unwrap();
  assert!(s.delete_user(vet.id).await.unwrap());
  assert!(!s.delete_user(vet.id).await.unwrap());
}

// ─── Orders ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_order_and_join_client() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();

  let order = s
    .add_order(NewOrder {
      client_id:          Some(ana.id),
      total_cents:        4_750,
      payment_status:     PaymentStatus::Pending,
      fulfillment_status: FulfillmentStatus::InProgress,
    })
    .await
    .unwrap();

  assert_eq!(order.total_cents, 4_750);

  let (row, client) = s.get_order(order.id).await.unwrap().unwrap();
  assert_eq!(row.id, order.id);
  assert_eq!(row.payment_status, PaymentStatus::Pending);
  assert_eq!(client.unwrap().id, ana.id);
}

#[tokio::test]
async fn get_order_missing_returns_none() {
  let s = rel().await;
  assert!(s.get_order(12).await.unwrap().is_none());
}

#[tokio::test]
async fn list_orders_filtered_by_status() {
  let s = rel().await;
  for payment in [
    PaymentStatus::Paid,
    PaymentStatus::Paid,
    PaymentStatus::Unpaid,
  ] {
    s.add_order(NewOrder {
      client_id: None,
      total_cents: 1_000,
      payment_status: payment,
      fulfillment_status: FulfillmentStatus::Unfulfilled,
    })
    .await
    .unwrap();
  }

  let (rows, total) = s
    .list_orders(
      OrderFilter { payment_status: Some(PaymentStatus::Paid), ..Default::default() },
      Page::default(),
    )
    .await
    .unwrap();
  assert_eq!(total, 2);
  assert!(rows.iter().all(|(o, _)| o.payment_status == PaymentStatus::Paid));
}

#[tokio::test]
async fn update_order_statuses() {
  let s = rel().await;
  let order = s
    .add_order(NewOrder {
      client_id:          None,
      total_cents:        1_000,
      payment_status:     PaymentStatus::Pending,
      fulfillment_status: FulfillmentStatus::InProgress,
    })
    .await
    .unwrap();

  let updated = s
    .update_order(order.id, OrderPatch {
      payment_status:     Some(PaymentStatus::Paid),
      fulfillment_status: Some(FulfillmentStatus::Fulfilled),
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.payment_status, PaymentStatus::Paid);
  assert_eq!(updated.fulfillment_status, FulfillmentStatus::Fulfilled);

  // empty patch reads the row back unchanged
  let same = s
    .update_order(order.id, OrderPatch::default())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(same.payment_status, PaymentStatus::Paid);
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_appointment_and_join_both_sides() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let rex = s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();

  let appt = s
    .add_appointment(booking(Some(ana.id), Some(rex.id), day(5)))
    .await
    .unwrap();
  assert_eq!(appt.appointment_date, day(5));

  let (row, client, pet_row) =
    s.get_appointment(appt.id).await.unwrap().unwrap();
  assert_eq!(row.status, AppointmentStatus::Pending);
  assert_eq!(client.unwrap().id, ana.id);
  assert_eq!(pet_row.unwrap().id, rex.id);
}

#[tokio::test]
async fn list_appointments_date_window_is_half_open() {
  let s = rel().await;
  for n in [1, 5, 9] {
    s.add_appointment(booking(None, None, day(n))).await.unwrap();
  }

  let (rows, total) = s
    .list_appointments(
      AppointmentFilter {
        date_from: Some(day(5)),
        date_to: Some(day(9)),
        ..Default::default()
      },
      Page::default(),
    )
    .await
    .unwrap();

  assert_eq!(total, 1);
  assert_eq!(rows[0].0.appointment_date, day(5));
}

#[tokio::test]
async fn list_appointments_soonest_first() {
  let s = rel().await;
  s.add_appointment(booking(None, None, day(9))).await.unwrap();
  s.add_appointment(booking(None, None, day(1))).await.unwrap();
  s.add_appointment(booking(None, None, day(5))).await.unwrap();

  let (rows, _) = s
    .list_appointments(AppointmentFilter::default(), Page::default())
    .await
    .unwrap();
  let dates: Vec<_> =
    rows.iter().map(|(a, _, _)| a.appointment_date).collect();
  assert_eq!(dates, vec![day(1), day(5), day(9)]);
}

#[tokio::test]
async fn list_appointments_by_status_and_client() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  let appt = s
    .add_appointment(booking(Some(ana.id), None, day(2)))
    .await
    .unwrap();
  s.add_appointment(booking(None, None, day(3))).await.unwrap();
  s.update_appointment(appt.id, AppointmentPatch {
    status: Some(AppointmentStatus::Completed),
    ..Default::default()
  })
  .await
  .unwrap();

  let (rows, total) = s
    .list_appointments(
      AppointmentFilter {
        status: Some(AppointmentStatus::Completed),
        client_id: Some(ana.id),
        ..Default::default()
      },
      Page::default(),
    )
    .await
    .unwrap();
  assert_eq!(total, 1);
  assert_eq!(rows[0].0.id, appt.id);
}

#[tokio::test]
async fn update_appointment_reschedules() {
  let s = rel().await;
  let appt = s.add_appointment(booking(None, None, day(2))).await.unwrap();

  let updated = s
    .update_appointment(appt.id, AppointmentPatch {
      appointment_date: Some(day(8)),
      payment_status: Some(AppointmentPayment::Paid),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.appointment_date, day(8));
  assert_eq!(updated.payment_status, AppointmentPayment::Paid);
  assert_eq!(updated.status, AppointmentStatus::Pending);
}

// ─── Record counts ───────────────────────────────────────────────────────────

#[tokio::test]
async fn record_counts_track_rows() {
  let s = rel().await;
  let ana = s.add_owner(owner("ana")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "rex")).await.unwrap();
  s.add_pet(pet(Some(ana.id), "mia")).await.unwrap();
  s.add_user(staff("admin", Role::Administrator)).await.unwrap();
  s.add_appointment(booking(Some(ana.id), None, day(1))).await.unwrap();

  let counts = s.counts().await.unwrap();
  assert_eq!(counts.owners, 1);
  assert_eq!(counts.pets, 2);
  assert_eq!(counts.users, 1);
  assert_eq!(counts.orders, 0);
  assert_eq!(counts.appointments, 1);
}

// ─── Products ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_product() {
  let d = docs().await;

  let added = d.add_product(product("Flea shampoo", "hygiene", 8)).await.unwrap();
  assert_eq!(added.stock, 8);
  assert!(added.active);

  let fetched = d.get_product(added.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Flea shampoo");
  assert_eq!(fetched.created_at, added.created_at);
}

#[tokio::test]
async fn get_product_missing_returns_none() {
  let d = docs().await;
  assert!(d.get_product(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_products_search_spans_catalog_fields() {
  let d = docs().await;
  d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();
  d.add_product(product("Dental sticks", "food", 5)).await.unwrap();
  d.add_product(NewProduct {
    description: "shampoo-adjacent conditioner".into(),
    ..product("Coat rinse", "hygiene", 5)
  })
  .await
  .unwrap();

  let (rows, total) = d
    .list_products(
      ProductFilter { search: Some("shampoo".into()), ..Default::default() },
      Page::default(),
    )
    .await
    .unwrap();
  // matches name on one product and description on another
  assert_eq!(total, 2);
  assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn list_products_category_and_active_filters() {
  let d = docs().await;
  d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();
  d.add_product(product("Dental sticks", "food", 5)).await.unwrap();
  let retired = d.add_product(product("Old kibble", "food", 0)).await.unwrap();
  d.update_product(retired.id, ProductPatch {
    active: Some(false),
    ..Default::default()
  })
  .await
  .unwrap();

  let (rows, total) = d
    .list_products(
      ProductFilter {
        category: Some("food".into()),
        active: Some(true),
        ..Default::default()
      },
      Page::default(),
    )
    .await
    .unwrap();
  assert_eq!(total, 1);
  assert_eq!(rows[0].name, "Dental sticks");
}

#[tokio::test]
async fn update_product_merges_and_bumps_updated_at() {
  let d = docs().await;
  let added = d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();

  let updated = d
    .update_product(added.id, ProductPatch {
      price_cents: Some(1_999),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.price_cents, 1_999);
  assert_eq!(updated.name, "Flea shampoo");
  assert_eq!(updated.created_at, added.created_at);
  assert!(updated.updated_at >= added.updated_at);
}

#[tokio::test]
async fn delete_product_reports_existence() {
  let d = docs().await;
  let added = d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();
  assert!(d.delete_product(added.id).await.unwrap());
  assert!(!d.delete_product(added.id).await.unwrap());
}

// ─── Stock guard ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn adjust_stock_reserve_refuse_restore() {
  let d = docs().await;
  let added = d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();

  let adjusted = d.adjust_stock(added.id, -3).await.unwrap();
  let StockAdjust::Adjusted(after) = adjusted else {
    panic!("expected Adjusted, got {adjusted:?}");
  };
  assert_eq!(after.stock, 2);

  // refused adjustment leaves stock untouched
  let refused = d.adjust_stock(added.id, -3).await.unwrap();
  assert!(matches!(
    refused,
    StockAdjust::Insufficient { ref name, stock: 2 } if name == "Flea shampoo"
  ));
  assert_eq!(d.get_product(added.id).await.unwrap().unwrap().stock, 2);

  let restored = d.adjust_stock(added.id, 4).await.unwrap();
  let StockAdjust::Adjusted(after) = restored else {
    panic!("expected Adjusted, got {restored:?}");
  };
  assert_eq!(after.stock, 6);
}

#[tokio::test]
async fn adjust_stock_allows_exact_depletion() {
  let d = docs().await;
  let added = d.add_product(product("Flea shampoo", "hygiene", 2)).await.unwrap();

  let adjusted = d.adjust_stock(added.id, -2).await.unwrap();
  let StockAdjust::Adjusted(after) = adjusted else {
    panic!("expected Adjusted, got {adjusted:?}");
  };
  assert_eq!(after.stock, 0);
}

#[tokio::test]
async fn adjust_stock_missing_product() {
  let d = docs().await;
  let outcome = d.adjust_stock(Uuid::new_v4(), -1).await.unwrap();
  assert!(matches!(outcome, StockAdjust::NotFound));
}

// ─── Services ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_service_with_subcategories() {
  let d = docs().await;

  let added = d.add_service(grooming()).await.unwrap();
  assert_eq!(added.subcategories.len(), 2);

  let fetched = d.get_service(added.id).await.unwrap().unwrap();
  assert_eq!(fetched.subcategories[0].id, "short-hair");
  assert_eq!(fetched.subcategories[1].price_cents, 3_500);
}

#[tokio::test]
async fn list_services_search_and_active() {
  let d = docs().await;
  d.add_service(grooming()).await.unwrap();
  let retired = d
    .add_service(NewService {
      name: "House calls".into(),
      description: "Home visit".into(),
      image: None,
      subcategories: Vec::new(),
      active: false,
    })
    .await
    .unwrap();

  let (rows, total) = d
    .list_services(
      ServiceFilter { active: Some(true), ..Default::default() },
      Page::default(),
    )
    .await
    .unwrap();
  assert_eq!(total, 1);
  assert_eq!(rows[0].name, "Grooming");

  let (rows, _) = d
    .list_services(
      ServiceFilter { search: Some("home".into()), ..Default::default() },
      Page::default(),
    )
    .await
    .unwrap();
  assert_eq!(rows[0].id, retired.id);
}

#[tokio::test]
async fn update_service_replaces_subcategories() {
  let d = docs().await;
  let added = d.add_service(grooming()).await.unwrap();

  let updated = d
    .update_service(added.id, ServicePatch {
      subcategories: Some(vec![Subcategory {
        id:          "puppy".into(),
        name:        "Puppy intro".into(),
        price_cents: 1_000,
      }]),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.subcategories.len(), 1);
  assert_eq!(updated.subcategories[0].id, "puppy");
}

// ─── Companion documents ─────────────────────────────────────────────────────

#[tokio::test]
async fn order_details_roundtrip() {
  let d = docs().await;
  let line = OrderLine {
    product_id:  Uuid::new_v4(),
    name:        "Flea shampoo".into(),
    quantity:    2,
    price_cents: 1_250,
  };
  d.put_order_details(OrderDetails {
    order_id:       11,
    products:       vec![line.clone()],
    notes:          "pickup at desk".into(),
    discount_cents: 0,
    tax_cents:      0,
  })
  .await
  .unwrap();

  let details = d.get_order_details(11).await.unwrap().unwrap();
  assert_eq!(details.products.len(), 1);
  assert_eq!(details.products[0].name, line.name);
  assert_eq!(details.notes, "pickup at desk");
}

#[tokio::test]
async fn merge_order_details_upserts_when_missing() {
  let d = docs().await;

  // no document was ever written for this order
  let details = d
    .merge_order_details(99, OrderDetailsPatch {
      notes: Some("call before delivery".into()),
    })
    .await
    .unwrap();

  assert_eq!(details.order_id, 99);
  assert!(details.products.is_empty());
  assert_eq!(details.notes, "call before delivery");
  assert!(d.get_order_details(99).await.unwrap().is_some());
}

#[tokio::test]
async fn merge_appointment_details_clinical_fields() {
  let d = docs().await;

  let details = d
    .merge_appointment_details(4, AppointmentDetailsPatch {
      diagnosis: Some("otitis externa".into()),
      treatment: Some("ear drops, 7 days".into()),
      follow_up: Some(FollowUp {
        required: true,
        date:     Some(day(20)),
        notes:    "recheck left ear".into(),
      }),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(details.appointment_id, 4);
  assert_eq!(details.diagnosis, "otitis externa");
  assert!(details.follow_up.required);

  // a second merge touches only what it names
  let details = d
    .merge_appointment_details(4, AppointmentDetailsPatch {
      notes: Some("pet calm during visit".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(details.diagnosis, "otitis externa");
  assert_eq!(details.notes, "pet calm during visit");
}

// ─── Medical history ─────────────────────────────────────────────────────────

#[tokio::test]
async fn add_medical_record_materialises_then_appends() {
  let d = docs().await;

  let first = MedicalRecord {
    date:            day(1),
    diagnosis:       "otitis externa".into(),
    treatment:       "ear drops".into(),
    observations:    "left ear".into(),
    veterinarian_id: 3,
  };
  let history = d.add_medical_record(8, first).await.unwrap();
  assert_eq!(history.pet_id, 8);
  assert_eq!(history.records.len(), 1);

  let second = MedicalRecord {
    date:            day(9),
    diagnosis:       "recheck".into(),
    treatment:       "none".into(),
    observations:    "resolved".into(),
    veterinarian_id: 3,
  };
  let history = d.add_medical_record(8, second).await.unwrap();
  assert_eq!(history.records.len(), 2);
  assert_eq!(history.records[0].diagnosis, "otitis externa");
  assert_eq!(history.records[1].diagnosis, "recheck");
}

#[tokio::test]
async fn add_vaccination_appends() {
  let d = docs().await;

  let history = d
    .add_vaccination(8, Vaccination {
      name:            "rabies".into(),
      date:            day(1),
      next_due:        Some(day(28)),
      veterinarian_id: 3,
    })
    .await
    .unwrap();

  assert_eq!(history.vaccinations.len(), 1);
  assert_eq!(history.vaccinations[0].name, "rabies");
  assert!(history.records.is_empty());
}

#[tokio::test]
async fn delete_medical_history_reports_existence() {
  let d = docs().await;
  d.add_vaccination(8, Vaccination {
    name:            "rabies".into(),
    date:            day(1),
    next_due:        None,
    veterinarian_id: 3,
  })
  .await
  .unwrap();

  assert!(d.delete_medical_history(8).await.unwrap());
  assert!(!d.delete_medical_history(8).await.unwrap());
  assert!(d.get_medical_history(8).await.unwrap().is_none());
}

// ─── User details ────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_activity_appends_and_stamps_login() {
  let d = docs().await;

  d.record_activity(
    7,
    "login".into(),
    serde_json::json!({ "ip": "10.0.0.1" }),
    day(1),
    true,
  )
  .await
  .unwrap();

  let details = d.get_user_details(7).await.unwrap().unwrap();
  assert_eq!(details.last_login, Some(day(1)));
  assert_eq!(details.activity_log.len(), 1);
  assert_eq!(details.activity_log[0].action, "login");

  // non-login activity leaves last_login alone
  d.record_activity(7, "update_profile".into(), serde_json::json!({}), day(2), false)
    .await
    .unwrap();

  let details = d.get_user_details(7).await.unwrap().unwrap();
  assert_eq!(details.last_login, Some(day(1)));
  assert_eq!(details.activity_log.len(), 2);
}

#[tokio::test]
async fn delete_user_details_reports_existence() {
  let d = docs().await;
  d.record_activity(7, "login".into(), serde_json::json!({}), day(1), true)
    .await
    .unwrap();

  assert!(d.delete_user_details(7).await.unwrap());
  assert!(!d.delete_user_details(7).await.unwrap());
}

// ─── Catalog counts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_counts_track_documents() {
  let d = docs().await;
  d.add_product(product("Flea shampoo", "hygiene", 5)).await.unwrap();
  d.add_product(product("Dental sticks", "food", 5)).await.unwrap();
  d.add_service(grooming()).await.unwrap();

  let counts = d.counts().await.unwrap();
  assert_eq!(counts.products, 2);
  assert_eq!(counts.services, 1);
}
