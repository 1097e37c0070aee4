//! SQLite backend for the Bean Market engine.
//!
//! The pool is opened in WAL mode with a busy timeout, so that readers never block the writer and concurrent writers
//! queue up instead of failing immediately.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
