//! # SQLite Database methods
//!
//! This module contains the "low-level" SQLite database interactions.
//!
//! They are plain functions that accept a `&mut SqliteConnection`, so callers can run them on a pooled connection
//! or inside a transaction (`&mut tx`) without any other changes.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod catalog;
pub mod directory;
pub mod orders;
pub mod tokens;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/b2b_orders.db";

pub fn db_url() -> String {
    let result = env::var("B2B_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ B2B_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist. Foreign keys are enforced.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
