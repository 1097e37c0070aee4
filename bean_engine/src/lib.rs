//! Bean Market Engine
//!
//! The Bean Market Engine holds the core logic of the Bean Market: a catalog of coffee bean listings, per-user carts,
//! and the fulfilment flow that turns payment processor notifications into orders. It knows nothing about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Database management and control (the `sqlite` backend and the [`mod@traits`] it implements). You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the [`mod@db_types`] module and are public.
//! 2. The engine public API (`bme_api`). This provides the public-facing functionality of the engine: listings, carts,
//!    profiles and order fulfilment. Storage backends need to implement the traits in [`mod@traits`] in order to act
//!    as a backend for the Bean Market server.
//!
//! Payment notifications are delivered at least once, in any order, and possibly concurrently. The fulfilment flow is
//! idempotent: however many times a notification for a given payment is handled, at most one succeeded order exists
//! for it, and the cart is emptied at most once.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod bme_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use bme_api::{
    cart_api::CartApi,
    catalog_api::CatalogApi,
    errors::OrderFlowError,
    order_flow_api::{EventAck, OrderFlowApi, DEFAULT_TX_TIMEOUT},
    profile_api::ProfileApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CartError,
    CartManagement,
    CatalogError,
    CatalogManagement,
    FulfilmentDatabase,
    FulfilmentError,
    InsertOrderResult,
    MaterializeResult,
    OrderManagement,
    OrderWithItems,
    PaymentOutcome,
    ProfileError,
    ProfileManagement,
};
