//! # Storage backend contracts
//!
//! This module defines the behaviour that a storage backend must expose to be used by the Bean Market engine.
//!
//! * [`CatalogManagement`] manages bean listings, with writes scoped to the listing owner.
//! * [`CartManagement`] manages per-user carts and their lines.
//! * [`OrderManagement`] provides read access to orders and their items.
//! * [`FulfilmentDatabase`] defines the highest level of behaviour: converting verified payment outcomes into orders,
//!   exactly once per payment.
//! * [`ProfileManagement`] manages user profiles.
mod cart_management;
mod catalog_management;
mod order_management;
mod profile_management;

pub mod data_objects;

pub use cart_management::{validate_quantity, CartError, CartManagement, MAX_ITEM_QUANTITY};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{InsertOrderResult, MaterializeResult, OrderWithItems, PaymentOutcome};
pub use order_management::{FulfilmentDatabase, FulfilmentError, OrderManagement};
pub use profile_management::{ProfileError, ProfileManagement};
