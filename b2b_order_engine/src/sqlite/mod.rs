//! SQLite backend for the order engine.
//!
//! The schema lives in `migrations/` and is embedded in the binary; call [`SqliteDatabase::migrate`] at start-up.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
