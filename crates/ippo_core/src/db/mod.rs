//! SQLite bootstrap for the persistent key-value backend.
//!
//! Connections handed to `SqliteKvStore` come from here, with the `kv`
//! table migrated. Failures surface as `StoreError`, the same error every
//! other store operation reports.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
