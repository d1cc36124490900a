//! SQLite implementation of [`DocumentStore`].
//!
//! Every document is one JSON body in a two-column table. Reads bring the
//! body out as a string and deserialize on the caller's side; read-modify-
//! write operations (merges, appends, the stock guard) run inside a single
//! `call` closure so no other access interleaves with them.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params, params_from_iter, types::Value};
use tokio_rusqlite::Connection;
use uuid::Uuid;
use vetbook_core::{
  document::{
    ActivityEntry, AppointmentDetails, AppointmentDetailsPatch,
    MedicalHistory, MedicalRecord, NewProduct, NewService, OrderDetails,
    OrderDetailsPatch, Product, ProductPatch, Service, ServicePatch,
    UserDetails, Vaccination,
  },
  store::{
    CatalogCounts, DocumentStore, Page, ProductFilter, ServiceFilter,
    StockAdjust,
  },
};

use crate::{
  Error, Result,
  encode::{encode_dt, encode_uuid, into_call_err},
  schema::DOCUMENT_SCHEMA,
};

/// Classified outcome of the guarded stock update, carried out of the
/// closure before any JSON parsing happens.
enum RawStock {
  Adjusted(String),
  Missing,
  Refused(String),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The document half of the backend: one serialized connection to the
/// JSON-body database.
#[derive(Clone)]
pub struct SqliteDocumentStore {
  conn: Connection,
}

impl SqliteDocumentStore {
  /// Open or create the document database at the given path.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path.as_ref()).await?;
    let store = SqliteDocumentStore { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory database. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory().await?;
    let store = SqliteDocumentStore { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DOCUMENT_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the underlying connection. Called once at process shutdown;
  /// outstanding clones of this handle fail after the close.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteDocumentStore {
  type Error = Error;

  // ── Products ──────────────────────────────────────────────────────────

  async fn add_product(&self, new: NewProduct) -> Result<Product> {
    let now = Utc::now();
    let product = Product {
      id:          Uuid::new_v4(),
      name:        new.name,
      description: new.description,
      price_cents: new.price_cents,
      stock:       new.stock,
      category:    new.category,
      image:       new.image,
      active:      new.active,
      created_at:  now,
      updated_at:  now,
    };
    let id = encode_uuid(product.id);
    let body = serde_json::to_string(&product)?;
    let stamp = encode_dt(now);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (id, body, created_at) VALUES (?1, ?2, ?3)",
          params![id, body, stamp],
        )?;
        Ok(())
      })
      .await?;
    Ok(product)
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let key = encode_uuid(id);
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM products WHERE id = ?1",
            params![key],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn list_products(
    &self,
    filter: ProductFilter,
    page: Page,
  ) -> Result<(Vec<Product>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (bodies, total) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(term) = filter.search {
          conds.push(
            "(json_extract(body, '$.name') LIKE ? OR json_extract(body, '$.description') LIKE ? OR json_extract(body, '$.category') LIKE ?)",
          );
          let pattern = format!("%{term}%");
          vals.push(Value::Text(pattern.clone()));
          vals.push(Value::Text(pattern.clone()));
          vals.push(Value::Text(pattern));
        }
        if let Some(category) = filter.category {
          conds.push("json_extract(body, '$.category') LIKE ?");
          vals.push(Value::Text(format!("%{category}%")));
        }
        if let Some(active) = filter.active {
          conds.push("json_extract(body, '$.active') = ?");
          vals.push(Value::Integer(i64::from(active)));
        }
        let where_sql = if conds.is_empty() {
          String::new()
        } else {
          format!(" WHERE {}", conds.join(" AND "))
        };
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM products{where_sql}"),
          params_from_iter(vals.clone()),
          |row| row.get(0),
        )?;
        vals.push(Value::Integer(limit));
        vals.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT body FROM products{where_sql}
           ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let bodies = stmt
          .query_map(params_from_iter(vals), |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((bodies, total))
      })
      .await?;
    let mut products = Vec::with_capacity(bodies.len());
    for body in bodies {
      products.push(serde_json::from_str(&body)?);
    }
    Ok((products, total as u64))
  }

  async fn update_product(
    &self,
    id: Uuid,
    patch: ProductPatch,
  ) -> Result<Option<Product>> {
    let key = encode_uuid(id);
    let now = Utc::now();
    let product = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM products WHERE id = ?1",
            params![key],
            |row| row.get(0),
          )
          .optional()?;
        let Some(body) = body else {
          return Ok(None);
        };
        let mut product =
          serde_json::from_str::<Product>(&body).map_err(into_call_err)?;
        if let Some(name) = patch.name {
          product.name = name;
        }
        if let Some(description) = patch.description {
          product.description = description;
        }
        if let Some(price_cents) = patch.price_cents {
          product.price_cents = price_cents;
        }
        if let Some(stock) = patch.stock {
          product.stock = stock;
        }
        if let Some(category) = patch.category {
          product.category = category;
        }
        if let Some(image) = patch.image {
          product.image = Some(image);
        }
        if let Some(active) = patch.active {
          product.active = active;
        }
        product.updated_at = now;
        let body = serde_json::to_string(&product).map_err(into_call_err)?;
        tx.execute(
          "UPDATE products SET body = ?2 WHERE id = ?1",
          params![key, body],
        )?;
        tx.commit()?;
        Ok(Some(product))
      })
      .await?;
    Ok(product)
  }

  async fn delete_product(&self, id: Uuid) -> Result<bool> {
    let key = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        let n =
          conn.execute("DELETE FROM products WHERE id = ?1", params![key])?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<StockAdjust> {
    let key = encode_uuid(id);
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE products
           SET body = json_set(body,
                               '$.stock', json_extract(body, '$.stock') + ?2,
                               '$.updated_at', ?3)
           WHERE id = ?1 AND json_extract(body, '$.stock') + ?2 >= 0",
          params![key, delta, stamp],
        )?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM products WHERE id = ?1",
            params![key],
            |row| row.get(0),
          )
          .optional()?;
        tx.commit()?;
        Ok(match (n, body) {
          (1, Some(body)) => RawStock::Adjusted(body),
          (_, Some(body)) => RawStock::Refused(body),
          _ => RawStock::Missing,
        })
      })
      .await?;
    match raw {
      RawStock::Adjusted(body) => {
        Ok(StockAdjust::Adjusted(serde_json::from_str(&body)?))
      }
      RawStock::Refused(body) => {
        let product: Product = serde_json::from_str(&body)?;
        Ok(StockAdjust::Insufficient {
          name:  product.name,
          stock: product.stock,
        })
      }
      RawStock::Missing => Ok(StockAdjust::NotFound),
    }
  }

  // ── Services ──────────────────────────────────────────────────────────

  async fn add_service(&self, new: NewService) -> Result<Service> {
    let now = Utc::now();
    let service = Service {
      id:            Uuid::new_v4(),
      name:          new.name,
      description:   new.description,
      image:         new.image,
      subcategories: new.subcategories,
      active:        new.active,
      created_at:    now,
      updated_at:    now,
    };
    let id = encode_uuid(service.id);
    let body = serde_json::to_string(&service)?;
    let stamp = encode_dt(now);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO services (id, body, created_at) VALUES (?1, ?2, ?3)",
          params![id, body, stamp],
        )?;
        Ok(())
      })
      .await?;
    Ok(service)
  }

  async fn get_service(&self, id: Uuid) -> Result<Option<Service>> {
    let key = encode_uuid(id);
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM services WHERE id = ?1",
            params![key],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn list_services(
    &self,
    filter: ServiceFilter,
    page: Page,
  ) -> Result<(Vec<Service>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (bodies, total) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(term) = filter.search {
          conds.push(
            "(json_extract(body, '$.name') LIKE ? OR json_extract(body, '$.description') LIKE ?)",
          );
          let pattern = format!("%{term}%");
          vals.push(Value::Text(pattern.clone()));
          vals.push(Value::Text(pattern));
        }
        if let Some(active) = filter.active {
          conds.push("json_extract(body, '$.active') = ?");
          vals.push(Value::Integer(i64::from(active)));
        }
        let where_sql = if conds.is_empty() {
          String::new()
        } else {
          format!(" WHERE {}", conds.join(" AND "))
        };
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM services{where_sql}"),
          params_from_iter(vals.clone()),
          |row| row.get(0),
        )?;
        vals.push(Value::Integer(limit));
        vals.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT body FROM services{where_sql}
           ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))?;
        let bodies = stmt
          .query_map(params_from_iter(vals), |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((bodies, total))
      })
      .await?;
    let mut services = Vec::with_capacity(bodies.len());
    for body in bodies {
      services.push(serde_json::from_str(&body)?);
    }
    Ok((services, total as u64))
  }

  async fn update_service(
    &self,
    id: Uuid,
    patch: ServicePatch,
  ) -> Result<Option<Service>> {
    let key = encode_uuid(id);
    let now = Utc::now();
    let service = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM services WHERE id = ?1",
            params![key],
            |row| row.get(0),
          )
          .optional()?;
        let Some(body) = body else {
          return Ok(None);
        };
        let mut service =
          serde_json::from_str::<Service>(&body).map_err(into_call_err)?;
        if let Some(name) = patch.name {
          service.name = name;
        }
        if let Some(description) = patch.description {
          service.description = description;
        }
        if let Some(image) = patch.image {
          service.image = Some(image);
        }
        if let Some(subcategories) = patch.subcategories {
          service.subcategories = subcategories;
        }
        if let Some(active) = patch.active {
          service.active = active;
        }
        service.updated_at = now;
        let body = serde_json::to_string(&service).map_err(into_call_err)?;
        tx.execute(
          "UPDATE services SET body = ?2 WHERE id = ?1",
          params![key, body],
        )?;
        tx.commit()?;
        Ok(Some(service))
      })
      .await?;
    Ok(service)
  }

  async fn delete_service(&self, id: Uuid) -> Result<bool> {
    let key = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        let n =
          conn.execute("DELETE FROM services WHERE id = ?1", params![key])?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Order details ─────────────────────────────────────────────────────

  async fn put_order_details(&self, details: OrderDetails) -> Result<()> {
    let order_id = details.order_id;
    let body = serde_json::to_string(&details)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO order_details (order_id, body) VALUES (?1, ?2)
           ON CONFLICT(order_id) DO UPDATE SET body = excluded.body",
          params![order_id, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_order_details(
    &self,
    order_id: i64,
  ) -> Result<Option<OrderDetails>> {
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM order_details WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn merge_order_details(
    &self,
    order_id: i64,
    patch: OrderDetailsPatch,
  ) -> Result<OrderDetails> {
    let details = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM order_details WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
          )
          .optional()?;
        let mut details = match body {
          Some(body) => serde_json::from_str::<OrderDetails>(&body)
            .map_err(into_call_err)?,
          None => OrderDetails::empty(order_id),
        };
        if let Some(notes) = patch.notes {
          details.notes = notes;
        }
        let body = serde_json::to_string(&details).map_err(into_call_err)?;
        tx.execute(
          "INSERT INTO order_details (order_id, body) VALUES (?1, ?2)
           ON CONFLICT(order_id) DO UPDATE SET body = excluded.body",
          params![order_id, body],
        )?;
        tx.commit()?;
        Ok(details)
      })
      .await?;
    Ok(details)
  }

  // ── Appointment details ───────────────────────────────────────────────

  async fn put_appointment_details(
    &self,
    details: AppointmentDetails,
  ) -> Result<()> {
    let appointment_id = details.appointment_id;
    let body = serde_json::to_string(&details)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointment_details (appointment_id, body)
           VALUES (?1, ?2)
           ON CONFLICT(appointment_id) DO UPDATE SET body = excluded.body",
          params![appointment_id, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_appointment_details(
    &self,
    appointment_id: i64,
  ) -> Result<Option<AppointmentDetails>> {
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM appointment_details WHERE appointment_id = ?1",
            params![appointment_id],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn merge_appointment_details(
    &self,
    appointment_id: i64,
    patch: AppointmentDetailsPatch,
  ) -> Result<AppointmentDetails> {
    let details = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM appointment_details WHERE appointment_id = ?1",
            params![appointment_id],
            |row| row.get(0),
          )
          .optional()?;
        let mut details = match body {
          Some(body) => serde_json::from_str::<AppointmentDetails>(&body)
            .map_err(into_call_err)?,
          None => AppointmentDetails::empty(appointment_id),
        };
        if let Some(notes) = patch.notes {
          details.notes = notes;
        }
        if let Some(diagnosis) = patch.diagnosis {
          details.diagnosis = diagnosis;
        }
        if let Some(treatment) = patch.treatment {
          details.treatment = treatment;
        }
        if let Some(follow_up) = patch.follow_up {
          details.follow_up = follow_up;
        }
        let body = serde_json::to_string(&details).map_err(into_call_err)?;
        tx.execute(
          "INSERT INTO appointment_details (appointment_id, body)
           VALUES (?1, ?2)
           ON CONFLICT(appointment_id) DO UPDATE SET body = excluded.body",
          params![appointment_id, body],
        )?;
        tx.commit()?;
        Ok(details)
      })
      .await?;
    Ok(details)
  }

  // ── Pet medical history ───────────────────────────────────────────────

  async fn put_medical_history(&self, history: MedicalHistory) -> Result<()> {
    let pet_id = history.pet_id;
    let body = serde_json::to_string(&history)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pet_medical_history (pet_id, body) VALUES (?1, ?2)
           ON CONFLICT(pet_id) DO UPDATE SET body = excluded.body",
          params![pet_id, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_medical_history(
    &self,
    pet_id: i64,
  ) -> Result<Option<MedicalHistory>> {
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM pet_medical_history WHERE pet_id = ?1",
            params![pet_id],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn add_medical_record(
    &self,
    pet_id: i64,
    record: MedicalRecord,
  ) -> Result<MedicalHistory> {
    let history = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM pet_medical_history WHERE pet_id = ?1",
            params![pet_id],
            |row| row.get(0),
          )
          .optional()?;
        let mut history = match body {
          Some(body) => serde_json::from_str::<MedicalHistory>(&body)
            .map_err(into_call_err)?,
          None => MedicalHistory::empty(pet_id),
        };
        history.records.push(record);
        let body = serde_json::to_string(&history).map_err(into_call_err)?;
        tx.execute(
          "INSERT INTO pet_medical_history (pet_id, body) VALUES (?1, ?2)
           ON CONFLICT(pet_id) DO UPDATE SET body = excluded.body",
          params![pet_id, body],
        )?;
        tx.commit()?;
        Ok(history)
      })
      .await?;
    Ok(history)
  }

  async fn add_vaccination(
    &self,
    pet_id: i64,
    vaccination: Vaccination,
  ) -> Result<MedicalHistory> {
    let history = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM pet_medical_history WHERE pet_id = ?1",
            params![pet_id],
            |row| row.get(0),
          )
          .optional()?;
        let mut history = match body {
          Some(body) => serde_json::from_str::<MedicalHistory>(&body)
            .map_err(into_call_err)?,
          None => MedicalHistory::empty(pet_id),
        };
        history.vaccinations.push(vaccination);
        let body = serde_json::to_string(&history).map_err(into_call_err)?;
        tx.execute(
          "INSERT INTO pet_medical_history (pet_id, body) VALUES (?1, ?2)
           ON CONFLICT(pet_id) DO UPDATE SET body = excluded.body",
          params![pet_id, body],
        )?;
        tx.commit()?;
        Ok(history)
      })
      .await?;
    Ok(history)
  }

  async fn delete_medical_history(&self, pet_id: i64) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM pet_medical_history WHERE pet_id = ?1",
          params![pet_id],
        )?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  // ── User details ──────────────────────────────────────────────────────

  async fn put_user_details(&self, details: UserDetails) -> Result<()> {
    let user_id = details.user_id;
    let body = serde_json::to_string(&details)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_details (user_id, body) VALUES (?1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET body = excluded.body",
          params![user_id, body],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_user_details(&self, user_id: i64) -> Result<Option<UserDetails>> {
    let body = self
      .conn
      .call(move |conn| {
        let body: Option<String> = conn
          .query_row(
            "SELECT body FROM user_details WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
          )
          .optional()?;
        Ok(body)
      })
      .await?;
    match body {
      Some(body) => Ok(Some(serde_json::from_str(&body)?)),
      None => Ok(None),
    }
  }

  async fn record_activity(
    &self,
    user_id: i64,
    action: String,
    details: serde_json::Value,
    at: DateTime<Utc>,
    set_last_login: bool,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM user_details WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
          )
          .optional()?;
        let mut doc = match body {
          Some(body) => serde_json::from_str::<UserDetails>(&body)
            .map_err(into_call_err)?,
          None => UserDetails::empty(user_id),
        };
        doc.activity_log.push(ActivityEntry {
          action,
          timestamp: at,
          details,
        });
        if set_last_login {
          doc.last_login = Some(at);
        }
        let body = serde_json::to_string(&doc).map_err(into_call_err)?;
        tx.execute(
          "INSERT INTO user_details (user_id, body) VALUES (?1, ?2)
           ON CONFLICT(user_id) DO UPDATE SET body = excluded.body",
          params![user_id, body],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_user_details(&self, user_id: i64) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM user_details WHERE user_id = ?1",
          params![user_id],
        )?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Stats ─────────────────────────────────────────────────────────────

  async fn counts(&self) -> Result<CatalogCounts> {
    let counts = self
      .conn
      .call(|conn| {
        let products: i64 = conn.query_row(
          "SELECT COUNT(*) FROM products",
          [],
          |row| row.get(0),
        )?;
        let services: i64 = conn.query_row(
          "SELECT COUNT(*) FROM services",
          [],
          |row| row.get(0),
        )?;
        Ok(CatalogCounts {
          products: products as u64,
          services: services as u64,
        })
      })
      .await?;
    Ok(counts)
  }
}
