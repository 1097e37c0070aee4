//! # Bean Market engine public API
//!
//! The `bme_api` module exposes the programmatic API for the Bean Market engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`catalog_api`] manages bean listings.
//! * [`cart_api`] manages users' carts, and computes checkout totals.
//! * [`order_flow_api`] is the primary API for turning payment processor notifications into orders.
//! * [`profile_api`] manages user profiles.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use bean_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let items = api.cart_items(&user_id).await?;
//! ```

pub mod cart_api;
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod profile_api;
