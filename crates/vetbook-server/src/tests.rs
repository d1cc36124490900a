//! End-to-end tests over the full router with in-memory stores.
//!
//! These exercise the dual-store contracts from the outside: encrypted
//! fields, token-based email lookups, the stock-reservation gap, the
//! companion-document default shapes, and the role gates.

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt as _;
use uuid::Uuid;
use vetbook_cipher::FieldCipher;
use vetbook_core::{
  record::{NewAppointment, NewOrder, NewUser, Role},
  store::{DocumentStore, OrderFilter, Page, RelationalStore},
};
use vetbook_store_sqlite::{SqliteDocumentStore, SqliteRelationalStore};

use crate::{
  AppState, ServerConfig,
  auth::{hash_password, issue_token},
  router,
};

type TestState = AppState<SqliteRelationalStore, SqliteDocumentStore>;

async fn make_state() -> TestState {
  let rel = SqliteRelationalStore::open_in_memory().await.unwrap();
  let doc = SqliteDocumentStore::open_in_memory().await.unwrap();
  AppState {
    rel:    Arc::new(rel),
    doc:    Arc::new(doc),
    cipher: Arc::new(FieldCipher::new("test-field-secret")),
    config: Arc::new(ServerConfig {
      host:          "127.0.0.1".into(),
      port:          0,
      relational_db: ":memory:".into(),
      documents_db:  ":memory:".into(),
      jwt_secret:    "test-jwt-secret".into(),
      field_secret:  "test-field-secret".into(),
    }),
  }
}

/// Insert a staff row directly and mint a token for it.
async fn seed_user(state: &TestState, email: &str, role: Role) -> (i64, String) {
  let user = state
    .rel
    .add_user(NewUser {
      encrypted_name:  state.cipher.encrypt("Seeded User").unwrap(),
      encrypted_email: state.cipher.encrypt(email).unwrap(),
      email_token:     state.cipher.search_token(email),
      password_hash:   hash_password("password123").unwrap(),
      role,
    })
    .await
    .unwrap();
  let token = issue_token(&user, email, &state.config.jwt_secret).unwrap();
  (user.id, token)
}

async fn send(
  state: &TestState,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let request = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = router(state.clone()).oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_product(
  state: &TestState,
  admin: &str,
  name: &str,
  price_cents: i64,
  stock: i64,
) -> Uuid {
  let (status, body) = send(state, "POST", "/api/products", Some(admin), Some(json!({
    "name": name,
    "price_cents": price_cents,
    "stock": stock,
    "category": "supplies",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["data"]["id"].as_str().unwrap().parse().unwrap()
}

async fn create_owner(state: &TestState, token: &str, name: &str, email: &str) -> i64 {
  let (status, body) = send(state, "POST", "/api/owners", Some(token), Some(json!({
    "name": name,
    "email": email,
    "phone": "+52 555 0100",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["data"]["id"].as_i64().unwrap()
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_login_round_trip() {
  let state = make_state().await;

  let (status, body) = send(&state, "POST", "/api/auth/register", None, Some(json!({
    "name": "Ana García",
    "email": "ana@vet.example",
    "password": "secret99",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert!(body["data"]["token"].as_str().is_some());
  assert_eq!(body["data"]["user"]["email"], "ana@vet.example");
  assert_eq!(body["data"]["user"]["role"], "receptionist");
  let user_id = body["data"]["user"]["id"].as_i64().unwrap();

  let (status, body) = send(&state, "POST", "/api/auth/login", None, Some(json!({
    "email": "ana@vet.example",
    "password": "secret99",
  })))
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["user"]["name"], "Ana García");

  // last_login stamped and both activity entries appended
  let details = state.doc.get_user_details(user_id).await.unwrap().unwrap();
  assert!(details.last_login.is_some());
  let actions: Vec<_> =
    details.activity_log.iter().map(|e| e.action.as_str()).collect();
  assert_eq!(actions, vec!["register", "login"]);
}

#[tokio::test]
async fn login_with_wrong_password_is_invalid_credentials() {
  let state = make_state().await;
  seed_user(&state, "vet@vet.example", Role::Veterinarian).await;

  let (status, body) = send(&state, "POST", "/api/auth/login", None, Some(json!({
    "email": "vet@vet.example",
    "password": "wrong",
  })))
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn duplicate_registration_is_email_exists() {
  let state = make_state().await;
  let register = json!({
    "name": "Ana", "email": "dup@vet.example", "password": "secret99",
  });
  let (status, _) =
    send(&state, "POST", "/api/auth/register", None, Some(register.clone())).await;
  assert_eq!(status, StatusCode::CREATED);

  // Same email, different ciphertext in storage; the token finds it anyway.
  let (status, body) =
    send(&state, "POST", "/api/auth/register", None, Some(register)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn missing_token_and_garbage_token() {
  let state = make_state().await;

  let (status, body) = send(&state, "GET", "/api/owners", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["code"], "TOKEN_REQUIRED");

  let (status, body) =
    send(&state, "GET", "/api/owners", Some("not-a-jwt"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn receptionist_cannot_use_admin_routes() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "desk@vet.example", Role::Receptionist).await;

  let (status, body) = send(&state, "POST", "/api/products", Some(&token), Some(json!({
    "name": "collar", "price_cents": 500, "stock": 3,
  })))
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");

  let (status, body) = send(&state, "GET", "/api/users", Some(&token), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn unknown_route_uses_the_envelope() {
  let state = make_state().await;
  let (status, body) = send(&state, "GET", "/api/nothing-here", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
  assert_eq!(body["code"], "NOT_FOUND");
}

// ── Owners ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn owner_fields_are_encrypted_at_rest_and_decrypted_on_read() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;
  let id = create_owner(&state, &token, "Carlos Ruiz", "carlos@mail.example").await;

  // Stored row holds ciphertext, not the plaintext name.
  let row = state.rel.get_owner(id).await.unwrap().unwrap();
  assert_ne!(row.encrypted_name, "Carlos Ruiz");
  assert_ne!(row.encrypted_email, "carlos@mail.example");

  let (status, body) = send(&state, "GET", "/api/owners", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["items"][0]["name"], "Carlos Ruiz");
  assert_eq!(body["data"]["items"][0]["email"], "carlos@mail.example");
}

#[tokio::test]
async fn owner_duplicate_email_is_rejected_via_token_lookup() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;
  create_owner(&state, &token, "First", "same@mail.example").await;

  let (status, body) = send(&state, "POST", "/api/owners", Some(&token), Some(json!({
    "name": "Second", "email": "Same@Mail.example", "phone": "x",
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
  assert_eq!(body["code"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn owner_create_requires_all_fields() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;

  let (status, body) = send(&state, "POST", "/api/owners", Some(&token), Some(json!({
    "name": "No Contact",
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "VALIDATION_ERROR");
  assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn owner_delete_blocked_by_pets_then_allowed() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;
  let owner_id = create_owner(&state, &token, "Ana", "ana@mail.example").await;

  let (status, body) = send(&state, "POST", "/api/pets", Some(&token), Some(json!({
    "name": "Firulais", "breed": "mestizo", "age": 4, "owner_id": owner_id,
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let pet_id = body["data"]["id"].as_i64().unwrap();

  let uri = format!("/api/owners/{owner_id}");
  let (status, body) = send(&state, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "OWNER_HAS_PETS");

  let (status, _) =
    send(&state, "DELETE", &format!("/api/pets/{pet_id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&state, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(state.rel.get_owner(owner_id).await.unwrap().is_none());
}

#[tokio::test]
async fn encrypted_search_filters_the_fetched_page_only() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;

  // 12 matching owners, then 3 newer non-matching ones. The newest-first
  // page of 10 holds 3 non-matching + 7 matching rows, so a search for
  // the matching name returns 7 items even though 12 matches exist.
  for i in 0..12 {
    create_owner(&state, &token, "Maravilla Pets", &format!("m{i}@mail.example")).await;
  }
  for i in 0..3 {
    create_owner(&state, &token, "Otro Cliente", &format!("o{i}@mail.example")).await;
  }

  let (status, body) = send(
    &state,
    "GET",
    "/api/owners?page=1&limit=10&search=maravilla",
    Some(&token),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let items = body["data"]["items"].as_array().unwrap();
  assert!(items.len() < 10, "page should undershoot, got {}", items.len());
  // pagination still reports the unfiltered store total
  assert_eq!(body["data"]["pagination"]["total"], 15);
}

// ── Pets & medical history ───────────────────────────────────────────────────

#[tokio::test]
async fn pet_create_writes_empty_history_and_delete_removes_it() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;

  let (status, body) = send(&state, "POST", "/api/pets", Some(&token), Some(json!({
    "name": "Luna",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let pet_id = body["data"]["id"].as_i64().unwrap();
  assert_eq!(body["data"]["health_status"], "Healthy");

  let history = state.doc.get_medical_history(pet_id).await.unwrap().unwrap();
  assert!(history.records.is_empty());

  let (status, _) =
    send(&state, "DELETE", &format!("/api/pets/{pet_id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(state.doc.get_medical_history(pet_id).await.unwrap().is_none());
}

#[tokio::test]
async fn pet_create_with_unknown_owner_is_404() {
  let state = make_state().await;
  let (_, token) = seed_user(&state, "staff@vet.example", Role::Receptionist).await;

  let (status, body) = send(&state, "POST", "/api/pets", Some(&token), Some(json!({
    "name": "Ghost", "owner_id": 4242,
  })))
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "OWNER_NOT_FOUND");
}

#[tokio::test]
async fn medical_record_append_is_gated_and_stamps_the_vet() {
  let state = make_state().await;
  let (_, desk) = seed_user(&state, "desk@vet.example", Role::Receptionist).await;
  let (vet_id, vet) = seed_user(&state, "vet@vet.example", Role::Veterinarian).await;

  let (_, body) = send(&state, "POST", "/api/pets", Some(&desk), Some(json!({
    "name": "Rocky",
  })))
  .await;
  let pet_id = body["data"]["id"].as_i64().unwrap();
  let uri = format!("/api/pets/{pet_id}/medical-history");

  let record = json!({ "diagnosis": "otitis", "treatment": "drops" });
  let (status, body) =
    send(&state, "POST", &uri, Some(&desk), Some(record.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["code"], "INSUFFICIENT_PERMISSIONS");

  let (status, body) = send(&state, "POST", &uri, Some(&vet), Some(record)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["records"][0]["veterinarian_id"], vet_id);

  let (status, body) = send(&state, "GET", &uri, Some(&desk), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn vaccination_append_materialises_history() {
  let state = make_state().await;
  let (_, vet) = seed_user(&state, "vet@vet.example", Role::Veterinarian).await;

  let (_, body) = send(&state, "POST", "/api/pets", Some(&vet), Some(json!({
    "name": "Misu",
  })))
  .await;
  let pet_id = body["data"]["id"].as_i64().unwrap();
  // simulate a failed companion write at creation time
  state.doc.delete_medical_history(pet_id).await.unwrap();

  let (status, body) = send(
    &state,
    "POST",
    &format!("/api/pets/{pet_id}/vaccinations"),
    Some(&vet),
    Some(json!({ "name": "rabies" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["vaccinations"][0]["name"], "rabies");
}

// ── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_manages_users_but_cannot_delete_self() {
  let state = make_state().await;
  let (admin_id, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;

  let (status, body) = send(&state, "POST", "/api/users", Some(&admin), Some(json!({
    "name": "New Vet",
    "email": "newvet@vet.example",
    "password": "secret99",
    "role": "veterinarian",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let new_id = body["data"]["id"].as_i64().unwrap();
  assert_eq!(body["data"]["role"], "veterinarian");

  // companion document got the "created" activity entry
  let details = state.doc.get_user_details(new_id).await.unwrap().unwrap();
  assert_eq!(details.activity_log[0].action, "created");
  assert_eq!(details.activity_log[0].details["by"], admin_id);

  let (status, body) = send(
    &state,
    "DELETE",
    &format!("/api/users/{admin_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "CANNOT_DELETE_SELF");

  let (status, _) = send(
    &state,
    "DELETE",
    &format!("/api/users/{new_id}"),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(state.doc.get_user_details(new_id).await.unwrap().is_none());
}

// ── Products & stock ─────────────────────────────────────────────────────────

#[tokio::test]
async fn stock_patch_add_and_guarded_subtract() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let id = create_product(&state, &admin, "shampoo", 1_500, 2).await;
  let uri = format!("/api/products/{id}/stock");

  let (status, body) = send(&state, "PATCH", &uri, Some(&admin), Some(json!({
    "operation": "add", "quantity": 3,
  })))
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["stock"], 5);

  let (status, body) = send(&state, "PATCH", &uri, Some(&admin), Some(json!({
    "operation": "subtract", "quantity": 9,
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "INSUFFICIENT_STOCK");
  assert_eq!(state.doc.get_product(id).await.unwrap().unwrap().stock, 5);

  let (status, body) = send(&state, "PATCH", &uri, Some(&admin), Some(json!({
    "operation": "sideways", "quantity": 1,
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ── Orders: the dual write ───────────────────────────────────────────────────

#[tokio::test]
async fn order_create_composes_row_and_document() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let client_id = create_owner(&state, &admin, "Ana", "ana@mail.example").await;
  let p1 = create_product(&state, &admin, "kibble 10kg", 8_000, 10).await;
  let p2 = create_product(&state, &admin, "leash", 1_200, 5).await;

  let (status, body) = send(&state, "POST", "/api/orders", Some(&admin), Some(json!({
    "client_id": client_id,
    "products": [
      { "product_id": p1, "quantity": 2 },
      { "product_id": p2, "quantity": 1 },
    ],
    "notes": "deliver after 6pm",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let order_id = body["data"]["id"].as_i64().unwrap();
  assert_eq!(body["data"]["total_cents"], 17_200);
  assert_eq!(body["data"]["client"]["name"], "Ana");
  assert_eq!(body["data"]["products"].as_array().unwrap().len(), 2);
  assert_eq!(body["data"]["products"][0]["name"], "kibble 10kg");
  assert_eq!(body["data"]["notes"], "deliver after 6pm");

  // stock reserved, snapshots persisted
  assert_eq!(state.doc.get_product(p1).await.unwrap().unwrap().stock, 8);
  let details = state.doc.get_order_details(order_id).await.unwrap().unwrap();
  assert_eq!(details.products[0].price_cents, 8_000);
}

#[tokio::test]
async fn order_with_insufficient_stock_leaves_no_trace() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let p1 = create_product(&state, &admin, "antibiotic", 3_000, 1).await;

  let (status, body) = send(&state, "POST", "/api/orders", Some(&admin), Some(json!({
    "products": [{ "product_id": p1, "quantity": 2 }],
  })))
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "INSUFFICIENT_STOCK");
  assert!(body["error"].as_str().unwrap().contains("antibiotic"));

  // guard refused: stock unchanged, no order row written
  assert_eq!(state.doc.get_product(p1).await.unwrap().unwrap().stock, 1);
  let (_, total) = state
    .rel
    .list_orders(OrderFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(total, 0);
}

#[tokio::test]
async fn order_partial_failure_keeps_earlier_stock_reservation() {
  // The documented non-atomic gap: the failing second line aborts the
  // order, but the first line's decrement is not compensated.
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let p1 = create_product(&state, &admin, "vitamins", 2_000, 5).await;
  let ghost = Uuid::new_v4();

  let (status, body) = send(&state, "POST", "/api/orders", Some(&admin), Some(json!({
    "products": [
      { "product_id": p1, "quantity": 1 },
      { "product_id": ghost, "quantity": 1 },
    ],
  })))
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "PRODUCT_NOT_FOUND");

  // no order row, no details document, but P1 is already down by one
  let (_, total) = state
    .rel
    .list_orders(OrderFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(total, 0);
  assert_eq!(state.doc.get_product(p1).await.unwrap().unwrap().stock, 4);
}

#[tokio::test]
async fn order_notes_patch_upserts_missing_document() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;

  // row-only order, as if the companion write had failed
  let order = state
    .rel
    .add_order(NewOrder {
      client_id:          None,
      total_cents:        0,
      payment_status:     vetbook_core::record::PaymentStatus::Pending,
      fulfillment_status: vetbook_core::record::FulfillmentStatus::Unfulfilled,
    })
    .await
    .unwrap();
  assert!(state.doc.get_order_details(order.id).await.unwrap().is_none());

  let (status, body) = send(
    &state,
    "PUT",
    &format!("/api/orders/{}", order.id),
    Some(&admin),
    Some(json!({ "notes": "recovered", "payment_status": "paid" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["payment_status"], "paid");
  assert_eq!(body["data"]["notes"], "recovered");

  let details = state.doc.get_order_details(order.id).await.unwrap().unwrap();
  assert_eq!(details.notes, "recovered");
  assert!(details.products.is_empty());
}

#[tokio::test]
async fn order_create_with_unknown_client_is_404_and_reserves_nothing() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let p1 = create_product(&state, &admin, "toy", 700, 3).await;

  let (status, body) = send(&state, "POST", "/api/orders", Some(&admin), Some(json!({
    "client_id": 999,
    "products": [{ "product_id": p1, "quantity": 1 }],
  })))
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "CLIENT_NOT_FOUND");
  // parent check runs before pricing, so no stock moved
  assert_eq!(state.doc.get_product(p1).await.unwrap().unwrap().stock, 3);
}

// ── Appointments ─────────────────────────────────────────────────────────────

async fn create_service_with_subcategories(
  state: &TestState,
  admin: &str,
  name: &str,
  subcategories: Value,
) -> Uuid {
  let (status, body) = send(state, "POST", "/api/services", Some(admin), Some(json!({
    "name": name,
    "subcategories": subcategories,
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["data"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn appointment_create_prices_subcategories_and_snapshots() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let client_id = create_owner(&state, &admin, "Ana", "ana@mail.example").await;
  let service = create_service_with_subcategories(
    &state,
    &admin,
    "consultation",
    json!([
      { "id": "general", "name": "general", "price_cents": 5_000 },
      { "id": "followup", "name": "follow-up", "price_cents": 3_000 },
    ]),
  )
  .await;

  let (status, body) =
    send(&state, "POST", "/api/appointments", Some(&admin), Some(json!({
      "client_id": client_id,
      "appointment_date": "2026-09-01T10:00:00Z",
      "services": [
        { "service_id": service, "subcategory_id": "followup" },
        { "service_id": service },
      ],
      "notes": "first visit",
    })))
    .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  // named subcategory 3000 + first-subcategory fallback 5000
  assert_eq!(body["data"]["total_cents"], 8_000);
  assert_eq!(body["data"]["status"], "pending");
  assert_eq!(body["data"]["services"][0]["price_cents"], 3_000);
  assert_eq!(body["data"]["services"][1]["subcategory_id"], Value::Null);

  let (status, body) = send(&state, "POST", "/api/appointments", Some(&admin), Some(json!({
    "appointment_date": "2026-09-01T11:00:00Z",
    "services": [{ "service_id": service, "subcategory_id": "nope" }],
  })))
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["code"], "SUBCATEGORY_NOT_FOUND");
}

#[tokio::test]
async fn service_without_subcategories_prices_at_zero() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let service =
    create_service_with_subcategories(&state, &admin, "weighing", json!([])).await;

  let (status, body) = send(&state, "POST", "/api/appointments", Some(&admin), Some(json!({
    "appointment_date": "2026-09-02T09:00:00Z",
    "services": [{ "service_id": service }],
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["total_cents"], 0);
}

#[tokio::test]
async fn appointment_without_document_composes_default_shape() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;

  // row-only appointment: the companion write never happened
  let appointment = state
    .rel
    .add_appointment(NewAppointment {
      client_id:        None,
      pet_id:           None,
      appointment_date: "2026-09-03T10:00:00Z".parse().unwrap(),
      status:           vetbook_core::record::AppointmentStatus::Pending,
      total_cents:      0,
      payment_status:   vetbook_core::record::AppointmentPayment::Unpaid,
    })
    .await
    .unwrap();

  let (status, body) = send(
    &state,
    "GET",
    &format!("/api/appointments/{}/details", appointment.id),
    Some(&admin),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["services"], json!([]));
  assert_eq!(body["data"]["notes"], "");
  assert_eq!(body["data"]["follow_up"]["required"], false);
}

#[tokio::test]
async fn appointment_clinical_patch_upserts_and_merges() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let service =
    create_service_with_subcategories(&state, &admin, "checkup", json!([])).await;

  let (_, body) = send(&state, "POST", "/api/appointments", Some(&admin), Some(json!({
    "appointment_date": "2026-09-04T10:00:00Z",
    "services": [{ "service_id": service }],
    "notes": "keep",
  })))
  .await;
  let id = body["data"]["id"].as_i64().unwrap();

  let (status, body) = send(
    &state,
    "PUT",
    &format!("/api/appointments/{id}"),
    Some(&admin),
    Some(json!({
      "status": "completed",
      "diagnosis": "healthy",
      "follow_up": { "required": true, "notes": "in two weeks" },
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["status"], "completed");
  assert_eq!(body["data"]["diagnosis"], "healthy");
  // untouched document fields survive the merge
  assert_eq!(body["data"]["notes"], "keep");
  assert_eq!(body["data"]["follow_up"]["required"], true);
}

#[tokio::test]
async fn appointment_list_filters_by_civil_day() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let service =
    create_service_with_subcategories(&state, &admin, "grooming", json!([])).await;

  for date in ["2026-09-05T09:00:00Z", "2026-09-05T17:30:00Z", "2026-09-06T09:00:00Z"] {
    let (status, _) = send(&state, "POST", "/api/appointments", Some(&admin), Some(json!({
      "appointment_date": date,
      "services": [{ "service_id": service }],
    })))
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, body) =
    send(&state, "GET", "/api/appointments?date=2026-09-05", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["pagination"]["total"], 2);

  let (status, body) =
    send(&state, "GET", "/api/appointments?date=yesterday", Some(&admin), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ── Stats ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stats_counts_both_stores_and_is_gated() {
  let state = make_state().await;
  let (_, admin) = seed_user(&state, "admin@vet.example", Role::Administrator).await;
  let (_, desk) = seed_user(&state, "desk@vet.example", Role::Receptionist).await;
  create_owner(&state, &admin, "Ana", "ana@mail.example").await;
  create_product(&state, &admin, "kibble", 8_000, 10).await;

  let (status, body) = send(&state, "GET", "/api/stats", Some(&desk), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

  let (status, body) = send(&state, "GET", "/api/stats", Some(&admin), None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["users"], 2);
  assert_eq!(body["data"]["owners"], 1);
  assert_eq!(body["data"]["products"], 1);
  assert_eq!(body["data"]["services"], 0);
}
