use std::fmt::Display;

use bean_engine::db_types::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub bean_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Everything the front end needs to complete a payment with the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub amount: Amount,
    pub currency: String,
}
