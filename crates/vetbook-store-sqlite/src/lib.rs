//! SQLite backends for the vetbook stores.
//!
//! Two independent databases, two independent connections:
//!
//! - [`SqliteRelationalStore`] owns the typed rows (owners, pets, users,
//!   orders, appointments) with foreign keys and explicit transactions.
//! - [`SqliteDocumentStore`] owns the catalog and companion documents as
//!   JSON bodies, with JSON1 predicates and the atomic guarded stock
//!   mutation.
//!
//! Nothing here spans both databases: there is no attached-database join
//! and no cross-store transaction. Each store wraps [`tokio_rusqlite`] so
//! database access runs off the async runtime; the per-connection command
//! channel also serialises closures, making each `call` an atomic unit
//! within the process.

mod doc;
mod encode;
mod rel;
mod schema;

pub mod error;

pub use doc::SqliteDocumentStore;
pub use error::{Error, Result};
pub use rel::SqliteRelationalStore;

#[cfg(test)]
mod tests;
