//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Functions that are used inside write transactions are written so that the first statement of the transaction is
//! always a write. SQLite then takes the write lock up front, and concurrent writers queue on the busy timeout
//! instead of failing when they try to upgrade a read lock.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod beans;
pub mod carts;
pub mod orders;
pub mod profiles;

const SQLITE_DB_URL: &str = "sqlite://data/bean_market.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("BM_DATABASE_URL").unwrap_or_else(|_| {
        info!("BM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// True if the error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}

/// True if the error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_foreign_key_violation())
}
