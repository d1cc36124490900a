//! SQL schemas for the two vetbook databases.
//!
//! Each schema is executed once at connection startup and stamped with
//! `PRAGMA user_version`. Future migrations will be gated on that number.
//!
//! Deliberately absent: any reference from one database into the other.
//! Companion-document keys (`order_id`, `appointment_id`, `pet_id`,
//! `user_id`) equal relational primary keys by application contract only.

/// Relational side: typed columns, foreign keys within the database.
/// Idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const RELATIONAL_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS owners (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    encrypted_name  TEXT NOT NULL,
    encrypted_email TEXT NOT NULL,
    encrypted_phone TEXT NOT NULL,
    email_token     TEXT NOT NULL,   -- keyed digest; equality lookups only
    created_at      TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS pets (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    encrypted_name TEXT NOT NULL,
    breed          TEXT,
    age            INTEGER,
    owner_id       INTEGER REFERENCES owners(id),
    health_status  TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    encrypted_name  TEXT NOT NULL,
    encrypted_email TEXT NOT NULL,
    email_token     TEXT NOT NULL,   -- logical uniqueness, checked in the app
    password_hash   TEXT NOT NULL,   -- argon2 PHC string; never decrypted
    role            TEXT NOT NULL,   -- 'administrator' | 'veterinarian' | 'receptionist'
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id          INTEGER REFERENCES owners(id) ON DELETE SET NULL,
    total_cents        INTEGER NOT NULL,
    payment_status     TEXT NOT NULL,   -- 'paid' | 'pending' | 'unpaid'
    fulfillment_status TEXT NOT NULL,   -- 'fulfilled' | 'in_progress' | 'unfulfilled'
    order_date         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id        INTEGER REFERENCES owners(id) ON DELETE SET NULL,
    pet_id           INTEGER REFERENCES pets(id)   ON DELETE SET NULL,
    appointment_date TEXT NOT NULL,
    status           TEXT NOT NULL,   -- 'pending' | 'completed' | 'cancelled'
    total_cents      INTEGER NOT NULL,
    payment_status   TEXT NOT NULL,   -- 'paid' | 'unpaid'
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS owners_email_token_idx ON owners(email_token);
CREATE INDEX IF NOT EXISTS users_email_token_idx  ON users(email_token);
CREATE INDEX IF NOT EXISTS pets_owner_idx         ON pets(owner_id);
CREATE INDEX IF NOT EXISTS orders_client_idx      ON orders(client_id);
CREATE INDEX IF NOT EXISTS orders_date_idx        ON orders(order_date);
CREATE INDEX IF NOT EXISTS appointments_date_idx  ON appointments(appointment_date);

PRAGMA user_version = 1;
";

/// Document side: one table per collection, one JSON body per row. The
/// catalog tables mirror `$.created_at` into a column for ordering; the
/// companion tables are keyed by their relational id alone.
pub const DOCUMENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS products (
    id         TEXT PRIMARY KEY,    -- hyphenated UUID
    body       TEXT NOT NULL,       -- full Product JSON
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS services (
    id         TEXT PRIMARY KEY,
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS order_details (
    order_id INTEGER PRIMARY KEY,
    body     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointment_details (
    appointment_id INTEGER PRIMARY KEY,
    body           TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pet_medical_history (
    pet_id INTEGER PRIMARY KEY,
    body   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_details (
    user_id INTEGER PRIMARY KEY,
    body    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
