//! SQLite implementation of [`RelationalStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension, params, params_from_iter, types::Value};
use tokio_rusqlite::Connection;
use vetbook_core::{
  record::{
    Appointment, AppointmentPatch, NewAppointment, NewOrder, NewOwner,
    NewPet, NewUser, Order, OrderPatch, Owner, OwnerPatch, Pet, PetPatch,
    User, UserPatch,
  },
  store::{
    AppointmentFilter, OrderFilter, OwnerDelete, Page, PetFilter,
    RecordCounts, RelationalStore,
  },
};

use crate::{
  Error, Result,
  encode::{RawAppointment, RawOrder, RawOwner, RawPet, RawUser, encode_dt},
  schema::RELATIONAL_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The relational half of the backend: one serialized connection to the
/// typed-row database. Rows cross the connection thread as `Raw*` string
/// bundles and are parsed into domain types on the caller's side.
#[derive(Clone)]
pub struct SqliteRelationalStore {
  conn: Connection,
}

impl SqliteRelationalStore {
  /// Open or create the relational database at the given path.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path.as_ref()).await?;
    let store = SqliteRelationalStore { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory database. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory().await?;
    let store = SqliteRelationalStore { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(RELATIONAL_SCHEMA)?;
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

// ─── RelationalStore impl ────────────────────────────────────────────────────

impl RelationalStore for SqliteRelationalStore {
  type Error = Error;

  // ── Owners ────────────────────────────────────────────────────────────

  async fn add_owner(&self, new: NewOwner) -> Result<Owner> {
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO owners
             (encrypted_name, encrypted_email, encrypted_phone, email_token, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            new.encrypted_name,
            new.encrypted_email,
            new.encrypted_phone,
            new.email_token,
            stamp
          ],
        )?;
        let id = conn.last_insert_rowid();
        let raw = conn.query_row(
          "SELECT id, encrypted_name, encrypted_email, encrypted_phone,
                  email_token, created_at
           FROM owners WHERE id = ?1",
          params![id],
          |row| RawOwner::read(row, 0),
        )?;
        Ok(raw)
      })
      .await?;
    raw.into_owner()
  }

  async fn get_owner(&self, id: i64) -> Result<Option<Owner>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, encrypted_email, encrypted_phone,
                    email_token, created_at
             FROM owners WHERE id = ?1",
            params![id],
            |row| RawOwner::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawOwner::into_owner).transpose()
  }

  async fn list_owners(&self, page: Page) -> Result<(Vec<Owner>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (raws, total) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row("SELECT COUNT(*) FROM owners", [], |row| row.get(0))?;
        let mut stmt = conn.prepare(
          "SELECT id, encrypted_name, encrypted_email, encrypted_phone,
                  email_token, created_at
           FROM owners
           ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let raws = stmt
          .query_map(params![limit, offset], |row| RawOwner::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((raws, total))
      })
      .await?;
    let owners = raws
      .into_iter()
      .map(RawOwner::into_owner)
      .collect::<Result<Vec<_>>>()?;
    Ok((owners, total as u64))
  }

  async fn update_owner(
    &self,
    id: i64,
    patch: OwnerPatch,
  ) -> Result<Option<Owner>> {
    if patch.is_empty() {
      return self.get_owner(id).await;
    }
    let raw = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(name) = patch.encrypted_name {
          sets.push("encrypted_name = ?");
          vals.push(Value::Text(name));
        }
        if let Some(email) = patch.encrypted_email {
          sets.push("encrypted_email = ?");
          vals.push(Value::Text(email));
        }
        if let Some(phone) = patch.encrypted_phone {
          sets.push("encrypted_phone = ?");
          vals.push(Value::Text(phone));
        }
        if let Some(token) = patch.email_token {
          sets.push("email_token = ?");
          vals.push(Value::Text(token));
        }
        vals.push(Value::Integer(id));
        conn.execute(
          &format!("UPDATE owners SET {} WHERE id = ?", sets.join(", ")),
          params_from_iter(vals),
        )?;
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, encrypted_email, encrypted_phone,
                    email_token, created_at
             FROM owners WHERE id = ?1",
            params![id],
            |row| RawOwner::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawOwner::into_owner).transpose()
  }

  async fn delete_owner(&self, id: i64) -> Result<OwnerDelete> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pets: i64 = tx.query_row(
          "SELECT COUNT(*) FROM pets WHERE owner_id = ?1",
          params![id],
          |row| row.get(0),
        )?;
        if pets > 0 {
          return Ok(OwnerDelete::HasPets);
        }
        let n = tx.execute("DELETE FROM owners WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(if n == 0 { OwnerDelete::NotFound } else { OwnerDelete::Deleted })
      })
      .await?;
    Ok(outcome)
  }

  fn find_owner_by_email(
    &self,
    email_token: &str,
  ) -> impl Future<Output = Result<Option<Owner>>> + Send + '_ {
    let token = email_token.to_owned();
    async move {
      let raw = self
        .conn
        .call(move |conn| {
          let raw = conn
            .query_row(
              "SELECT id, encrypted_name, encrypted_email, encrypted_phone,
                      email_token, created_at
               FROM owners WHERE email_token = ?1",
              params![token],
              |row| RawOwner::read(row, 0),
            )
            .optional()?;
          Ok(raw)
        })
        .await?;
      raw.map(RawOwner::into_owner).transpose()
    }
  }

  async fn pets_of_owner(&self, owner_id: i64) -> Result<Vec<Pet>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, encrypted_name, breed, age, owner_id, health_status,
                  created_at
           FROM pets WHERE owner_id = ?1
           ORDER BY created_at DESC, id DESC",
        )?;
        let raws = stmt
          .query_map(params![owner_id], |row| RawPet::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawPet::into_pet).collect()
  }

  // ── Pets ──────────────────────────────────────────────────────────────

  async fn add_pet(&self, new: NewPet) -> Result<Pet> {
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pets
             (encrypted_name, breed, age, owner_id, health_status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            new.encrypted_name,
            new.breed,
            new.age,
            new.owner_id,
            new.health_status,
            stamp
          ],
        )?;
        let id = conn.last_insert_rowid();
        let raw = conn.query_row(
          "SELECT id, encrypted_name, breed, age, owner_id, health_status,
                  created_at
           FROM pets WHERE id = ?1",
          params![id],
          |row| RawPet::read(row, 0),
        )?;
        Ok(raw)
      })
      .await?;
    raw.into_pet()
  }

  async fn get_pet(&self, id: i64) -> Result<Option<Pet>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, breed, age, owner_id, health_status,
                    created_at
             FROM pets WHERE id = ?1",
            params![id],
            |row| RawPet::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawPet::into_pet).transpose()
  }

  async fn list_pets(
    &self,
    filter: PetFilter,
    page: Page,
  ) -> Result<(Vec<(Pet, Option<Owner>)>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (raws, total) = self
      .conn
      .call(move |conn| {
        let mut where_sql = String::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(owner_id) = filter.owner_id {
          where_sql.push_str(" WHERE p.owner_id = ?");
          vals.push(Value::Integer(owner_id));
        }
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM pets p{where_sql}"),
          params_from_iter(vals.clone()),
          |row| row.get(0),
        )?;
        vals.push(Value::Integer(limit));
        vals.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT p.id, p.encrypted_name, p.breed, p.age, p.owner_id,
                  p.health_status, p.created_at,
                  o.id, o.encrypted_name, o.encrypted_email, o.encrypted_phone,
                  o.email_token, o.created_at
           FROM pets p LEFT JOIN owners o ON o.id = p.owner_id{where_sql}
           ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        ))?;
        let raws = stmt
          .query_map(params_from_iter(vals), |row| {
            Ok((RawPet::read(row, 0)?, RawOwner::read_opt(row, 7)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((raws, total))
      })
      .await?;
    let mut pets = Vec::with_capacity(raws.len());
    for (pet, owner) in raws {
      pets.push((pet.into_pet()?, owner.map(RawOwner::into_owner).transpose()?));
    }
    Ok((pets, total as u64))
  }

  async fn update_pet(&self, id: i64, patch: PetPatch) -> Result<Option<Pet>> {
    if patch.is_empty() {
      return self.get_pet(id).await;
    }
    let raw = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(name) = patch.encrypted_name {
          sets.push("encrypted_name = ?");
          vals.push(Value::Text(name));
        }
        if let Some(breed) = patch.breed {
          sets.push("breed = ?");
          vals.push(Value::Text(breed));
        }
        if let Some(age) = patch.age {
          sets.push("age = ?");
          vals.push(Value::Integer(age));
        }
        if let Some(owner_id) = patch.owner_id {
          sets.push("owner_id = ?");
          vals.push(Value::Integer(owner_id));
        }
        if let Some(status) = patch.health_status {
          sets.push("health_status = ?");
          vals.push(Value::Text(status));
        }
        vals.push(Value::Integer(id));
        conn.execute(
          &format!("UPDATE pets SET {} WHERE id = ?", sets.join(", ")),
          params_from_iter(vals),
        )?;
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, breed, age, owner_id, health_status,
                    created_at
             FROM pets WHERE id = ?1",
            params![id],
            |row| RawPet::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawPet::into_pet).transpose()
  }

  async fn delete_pet(&self, id: i64) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM pets WHERE id = ?1", params![id])?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Users ─────────────────────────────────────────────────────────────

  async fn add_user(&self, new: NewUser) -> Result<User> {
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users
             (encrypted_name, encrypted_email, email_token, password_hash,
              role, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          params![
            new.encrypted_name,
            new.encrypted_email,
            new.email_token,
            new.password_hash,
            new.role.as_str(),
            stamp
          ],
        )?;
        let id = conn.last_insert_rowid();
        let raw = conn.query_row(
          "SELECT id, encrypted_name, encrypted_email, email_token,
                  password_hash, role, created_at, updated_at
           FROM users WHERE id = ?1",
          params![id],
          |row| RawUser::read(row, 0),
        )?;
        Ok(raw)
      })
      .await?;
    raw.into_user()
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, encrypted_email, email_token,
                    password_hash, role, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            |row| RawUser::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, encrypted_name, encrypted_email, email_token,
                  password_hash, role, created_at, updated_at
           FROM users ORDER BY id",
        )?;
        let raws = stmt
          .query_map([], |row| RawUser::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(
    &self,
    id: i64,
    patch: UserPatch,
  ) -> Result<Option<User>> {
    if patch.is_empty() {
      return self.get_user(id).await;
    }
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(name) = patch.encrypted_name {
          sets.push("encrypted_name = ?");
          vals.push(Value::Text(name));
        }
        if let Some(email) = patch.encrypted_email {
          sets.push("encrypted_email = ?");
          vals.push(Value::Text(email));
        }
        if let Some(token) = patch.email_token {
          sets.push("email_token = ?");
          vals.push(Value::Text(token));
        }
        if let Some(hash) = patch.password_hash {
          sets.push("password_hash = ?");
          vals.push(Value::Text(hash));
        }
        if let Some(role) = patch.role {
          sets.push("role = ?");
          vals.push(Value::Text(role.as_str().to_owned()));
        }
        sets.push("updated_at = ?");
        vals.push(Value::Text(stamp));
        vals.push(Value::Integer(id));
        conn.execute(
          &format!("UPDATE users SET {} WHERE id = ?", sets.join(", ")),
          params_from_iter(vals),
        )?;
        let raw = conn
          .query_row(
            "SELECT id, encrypted_name, encrypted_email, email_token,
                    password_hash, role, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            |row| RawUser::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, id: i64) -> Result<bool> {
    let n = self
      .conn
      .call(move |conn| {
        let n = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(n)
      })
      .await?;
    Ok(n > 0)
  }

  fn find_user_by_email(
    &self,
    email_token: &str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + '_ {
    let token = email_token.to_owned();
    async move {
      let raw = self
        .conn
        .call(move |conn| {
          let raw = conn
            .query_row(
              "SELECT id, encrypted_name, encrypted_email, email_token,
                      password_hash, role, created_at, updated_at
               FROM users WHERE email_token = ?1",
              params![token],
              |row| RawUser::read(row, 0),
            )
            .optional()?;
          Ok(raw)
        })
        .await?;
      raw.map(RawUser::into_user).transpose()
    }
  }

  // ── Orders ────────────────────────────────────────────────────────────

  async fn add_order(&self, new: NewOrder) -> Result<Order> {
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO orders
             (client_id, total_cents, payment_status, fulfillment_status,
              order_date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            new.client_id,
            new.total_cents,
            new.payment_status.as_str(),
            new.fulfillment_status.as_str(),
            stamp
          ],
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(
          "SELECT id, client_id, total_cents, payment_status,
                  fulfillment_status, order_date
           FROM orders WHERE id = ?1",
          params![id],
          |row| RawOrder::read(row, 0),
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw.into_order()
  }

  async fn get_order(&self, id: i64) -> Result<Option<(Order, Option<Owner>)>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT o.id, o.client_id, o.total_cents, o.payment_status,
                    o.fulfillment_status, o.order_date,
                    c.id, c.encrypted_name, c.encrypted_email,
                    c.encrypted_phone, c.email_token, c.created_at
             FROM orders o LEFT JOIN owners c ON c.id = o.client_id
             WHERE o.id = ?1",
            params![id],
            |row| Ok((RawOrder::read(row, 0)?, RawOwner::read_opt(row, 6)?)),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    match raw {
      Some((order, client)) => Ok(Some((
        order.into_order()?,
        client.map(RawOwner::into_owner).transpose()?,
      ))),
      None => Ok(None),
    }
  }

  async fn list_orders(
    &self,
    filter: OrderFilter,
    page: Page,
  ) -> Result<(Vec<(Order, Option<Owner>)>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (raws, total) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(payment) = filter.payment_status {
          conds.push("o.payment_status = ?");
          vals.push(Value::Text(payment.as_str().to_owned()));
        }
        if let Some(fulfillment) = filter.fulfillment_status {
          conds.push("o.fulfillment_status = ?");
          vals.push(Value::Text(fulfillment.as_str().to_owned()));
        }
        let where_sql = if conds.is_empty() {
          String::new()
        } else {
          format!(" WHERE {}", conds.join(" AND "))
        };
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM orders o{where_sql}"),
          params_from_iter(vals.clone()),
          |row| row.get(0),
        )?;
        vals.push(Value::Integer(limit));
        vals.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT o.id, o.client_id, o.total_cents, o.payment_status,
                  o.fulfillment_status, o.order_date,
                  c.id, c.encrypted_name, c.encrypted_email, c.encrypted_phone,
                  c.email_token, c.created_at
           FROM orders o LEFT JOIN owners c ON c.id = o.client_id{where_sql}
           ORDER BY o.order_date DESC, o.id DESC LIMIT ? OFFSET ?"
        ))?;
        let raws = stmt
          .query_map(params_from_iter(vals), |row| {
            Ok((RawOrder::read(row, 0)?, RawOwner::read_opt(row, 6)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((raws, total))
      })
      .await?;
    let mut orders = Vec::with_capacity(raws.len());
    for (order, client) in raws {
      orders.push((
        order.into_order()?,
        client.map(RawOwner::into_owner).transpose()?,
      ));
    }
    Ok((orders, total as u64))
  }

  async fn update_order(
    &self,
    id: i64,
    patch: OrderPatch,
  ) -> Result<Option<Order>> {
    if patch.is_empty() {
      let raw = self
        .conn
        .call(move |conn| {
          let raw = conn
            .query_row(
              "SELECT id, client_id, total_cents, payment_status,
                      fulfillment_status, order_date
               FROM orders WHERE id = ?1",
              params![id],
              |row| RawOrder::read(row, 0),
            )
            .optional()?;
          Ok(raw)
        })
        .await?;
      return raw.map(RawOrder::into_order).transpose();
    }
    let raw = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(payment) = patch.payment_status {
          sets.push("payment_status = ?");
          vals.push(Value::Text(payment.as_str().to_owned()));
        }
        if let Some(fulfillment) = patch.fulfillment_status {
          sets.push("fulfillment_status = ?");
          vals.push(Value::Text(fulfillment.as_str().to_owned()));
        }
        vals.push(Value::Integer(id));
        conn.execute(
          &format!("UPDATE orders SET {} WHERE id = ?", sets.join(", ")),
          params_from_iter(vals),
        )?;
        let raw = conn
          .query_row(
            "SELECT id, client_id, total_cents, payment_status,
                    fulfillment_status, order_date
             FROM orders WHERE id = ?1",
            params![id],
            |row| RawOrder::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawOrder::into_order).transpose()
  }

  // ── Appointments ──────────────────────────────────────────────────────

  async fn add_appointment(&self, new: NewAppointment) -> Result<Appointment> {
    let date = encode_dt(new.appointment_date);
    let stamp = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO appointments
             (client_id, pet_id, appointment_date, status, total_cents,
              payment_status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            new.client_id,
            new.pet_id,
            date,
            new.status.as_str(),
            new.total_cents,
            new.payment_status.as_str(),
            stamp
          ],
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(
          "SELECT id, client_id, pet_id, appointment_date, status,
                  total_cents, payment_status, created_at
           FROM appointments WHERE id = ?1",
          params![id],
          |row| RawAppointment::read(row, 0),
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw.into_appointment()
  }

  async fn get_appointment(
    &self,
    id: i64,
  ) -> Result<Option<(Appointment, Option<Owner>, Option<Pet>)>> {
    let raw = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT a.id, a.client_id, a.pet_id, a.appointment_date, a.status,
                    a.total_cents, a.payment_status, a.created_at,
                    c.id, c.encrypted_name, c.encrypted_email,
                    c.encrypted_phone, c.email_token, c.created_at,
                    p.id, p.encrypted_name, p.breed, p.age, p.owner_id,
                    p.health_status, p.created_at
             FROM appointments a
             LEFT JOIN owners c ON c.id = a.client_id
             LEFT JOIN pets p ON p.id = a.pet_id
             WHERE a.id = ?1",
            params![id],
            |row| {
              Ok((
                RawAppointment::read(row, 0)?,
                RawOwner::read_opt(row, 8)?,
                RawPet::read_opt(row, 14)?,
              ))
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    match raw {
      Some((appointment, client, pet)) => Ok(Some((
        appointment.into_appointment()?,
        client.map(RawOwner::into_owner).transpose()?,
        pet.map(RawPet::into_pet).transpose()?,
      ))),
      None => Ok(None),
    }
  }

  async fn list_appointments(
    &self,
    filter: AppointmentFilter,
    page: Page,
  ) -> Result<(Vec<(Appointment, Option<Owner>, Option<Pet>)>, u64)> {
    let limit = i64::from(page.limit);
    let offset = page.offset() as i64;
    let (raws, total) = self
      .conn
      .call(move |conn| {
        let mut conds: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(status) = filter.status {
          conds.push("a.status = ?");
          vals.push(Value::Text(status.as_str().to_owned()));
        }
        if let Some(client_id) = filter.client_id {
          conds.push("a.client_id = ?");
          vals.push(Value::Integer(client_id));
        }
        if let Some(from) = filter.date_from {
          conds.push("a.appointment_date >= ?");
          vals.push(Value::Text(encode_dt(from)));
        }
        if let Some(to) = filter.date_to {
          conds.push("a.appointment_date < ?");
          vals.push(Value::Text(encode_dt(to)));
        }
        let where_sql = if conds.is_empty() {
          String::new()
        } else {
          format!(" WHERE {}", conds.join(" AND "))
        };
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM appointments a{where_sql}"),
          params_from_iter(vals.clone()),
          |row| row.get(0),
        )?;
        vals.push(Value::Integer(limit));
        vals.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
          "SELECT a.id, a.client_id, a.pet_id, a.appointment_date, a.status,
                  a.total_cents, a.payment_status, a.created_at,
                  c.id, c.encrypted_name, c.encrypted_email, c.encrypted_phone,
                  c.email_token, c.created_at,
                  p.id, p.encrypted_name, p.breed, p.age, p.owner_id,
                  p.health_status, p.created_at
           FROM appointments a
           LEFT JOIN owners c ON c.id = a.client_id
           LEFT JOIN pets p ON p.id = a.pet_id{where_sql}
           ORDER BY a.appointment_date ASC, a.id ASC LIMIT ? OFFSET ?"
        ))?;
        let raws = stmt
          .query_map(params_from_iter(vals), |row| {
            Ok((
              RawAppointment::read(row, 0)?,
              RawOwner::read_opt(row, 8)?,
              RawPet::read_opt(row, 14)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((raws, total))
      })
      .await?;
    let mut appointments = Vec::with_capacity(raws.len());
    for (appointment, client, pet) in raws {
      appointments.push((
        appointment.into_appointment()?,
        client.map(RawOwner::into_owner).transpose()?,
        pet.map(RawPet::into_pet).transpose()?,
      ));
    }
    Ok((appointments, total as u64))
  }

  async fn update_appointment(
    &self,
    id: i64,
    patch: AppointmentPatch,
  ) -> Result<Option<Appointment>> {
    if patch.is_empty() {
      let raw = self
        .conn
        .call(move |conn| {
          let raw = conn
            .query_row(
              "SELECT id, client_id, pet_id, appointment_date, status,
                      total_cents, payment_status, created_at
               FROM appointments WHERE id = ?1",
              params![id],
              |row| RawAppointment::read(row, 0),
            )
            .optional()?;
          Ok(raw)
        })
        .await?;
      return raw.map(RawAppointment::into_appointment).transpose();
    }
    let raw = self
      .conn
      .call(move |conn| {
        let mut sets: Vec<&str> = Vec::new();
        let mut vals: Vec<Value> = Vec::new();
        if let Some(date) = patch.appointment_date {
          sets.push("appointment_date = ?");
          vals.push(Value::Text(encode_dt(date)));
        }
        if let Some(status) = patch.status {
          sets.push("status = ?");
          vals.push(Value::Text(status.as_str().to_owned()));
        }
        if let Some(payment) = patch.payment_status {
          sets.push("payment_status = ?");
          vals.push(Value::Text(payment.as_str().to_owned()));
        }
        vals.push(Value::Integer(id));
        conn.execute(
          &format!("UPDATE appointments SET {} WHERE id = ?", sets.join(", ")),
          params_from_iter(vals),
        )?;
        let raw = conn
          .query_row(
            "SELECT id, client_id, pet_id, appointment_date, status,
                    total_cents, payment_status, created_at
             FROM appointments WHERE id = ?1",
            params![id],
            |row| RawAppointment::read(row, 0),
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawAppointment::into_appointment).transpose()
  }

  // ── Stats ─────────────────────────────────────────────────────────────

  async fn counts(&self) -> Result<RecordCounts> {
    let counts = self
      .conn
      .call(|conn| {
        let users: i64 =
          conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let owners: i64 =
          conn.query_row("SELECT COUNT(*) FROM owners", [], |row| row.get(0))?;
        let pets: i64 =
          conn.query_row("SELECT COUNT(*) FROM pets", [], |row| row.get(0))?;
        let orders: i64 =
          conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
        let appointments: i64 = conn.query_row(
          "SELECT COUNT(*) FROM appointments",
          [],
          |row| row.get(0),
        )?;
        Ok(RecordCounts {
          users:        users as u64,
          owners:       owners as u64,
          pets:         pets as u64,
          orders:       orders as u64,
          appointments: appointments as u64,
        })
      })
      .await?;
    Ok(counts)
  }
}
