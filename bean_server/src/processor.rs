//! The payment processor client.
//!
//! Checkout asks the processor to create a payment intent for the cart total. The user id is attached to the intent
//! as metadata, and comes back to us in the signed payment notifications, which is how a payment is matched to a cart.
//!
//! The client is built once at start-up and shared by every worker.
use std::sync::Arc;

use bean_engine::db_types::{Amount, UserId};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProcessorConfig;

pub const DEFAULT_PROCESSOR_BASE_URL: &str = "https://api.stripe.com";

#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    #[error("Could not initialize the payment processor client. {0}")]
    Initialization(String),
    #[error("The payment processor request failed. {0}")]
    RestResponseError(String),
    #[error("Could not deserialize the payment processor response. {0}")]
    JsonError(String),
    #[error("The payment processor rejected the request ({status}). {message}")]
    QueryError { status: u16, message: String },
}

/// A payable intent, as returned by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// The processor's id for the intent. Notifications about this payment carry it as the payment reference.
    pub id: String,
    /// Handed to the front end so that it can complete the payment directly with the processor.
    pub client_secret: String,
}

#[allow(async_fn_in_trait)]
pub trait PaymentProcessor {
    /// Creates a payment intent for `amount` (in minor units of `currency`), tagged with the paying user's id.
    async fn create_payment_intent(
        &self,
        amount: Amount,
        currency: &str,
        user_id: &UserId,
    ) -> Result<PaymentIntent, ProcessorError>;
}

#[derive(Clone)]
pub struct StripeClient {
    base_url: String,
    client: Arc<Client>,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StripeClient ({})", self.base_url)
    }
}

impl StripeClient {
    pub fn new(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| ProcessorError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ProcessorError::Initialization(e.to_string()))?;
        Ok(Self { base_url: config.base_url.trim_end_matches('/').to_string(), client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: Amount,
        currency: &str,
        user_id: &UserId,
    ) -> Result<PaymentIntent, ProcessorError> {
        let url = self.url("/v1/payment_intents");
        let amount = amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
            ("metadata[user_id]", user_id.as_str()),
        ];
        trace!("💳️ Creating payment intent for {} ({amount} {currency})", user_id.short());
        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProcessorError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            let intent = response.json::<PaymentIntent>().await.map_err(|e| ProcessorError::JsonError(e.to_string()))?;
            info!("💳️ Payment intent {} created for {}", intent.id, user_id.short());
            Ok(intent)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| ProcessorError::RestResponseError(e.to_string()))?;
            warn!("💳️ Payment intent creation for {} failed with status {status}. {body}", user_id.short());
            let message = "The payment intent could not be created.".to_string();
            Err(ProcessorError::QueryError { status, message })
        }
    }
}
