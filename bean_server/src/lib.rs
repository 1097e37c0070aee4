//! # Bean market server
//! This crate hosts the HTTP server for the bean market. It is responsible for:
//! * Serving the catalog, cart, order history and profile APIs to authenticated users.
//! * Creating payment intents with the payment processor at checkout.
//! * Receiving signed payment notifications from the processor and handing them to the fulfilment engine, which turns
//!   the paying user's cart into an order.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The user-facing API. See [routes](routes/index.html).
//! * `/webhooks/payments`: Payment notifications from the processor.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod processor;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
