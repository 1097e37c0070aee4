use std::time::Duration;

use thiserror::Error;

use crate::traits::FulfilmentError;

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The event could not be parsed. {0}")]
    MalformedEvent(String),
    #[error("Event {0} does not say which user the payment belongs to")]
    MissingUserId(String),
    #[error("The fulfilment transaction did not complete within {0:?} and was rolled back")]
    Timeout(Duration),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
}

impl OrderFlowError {
    /// Errors that are expected to go away if the same notification is delivered again later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::Timeout(_))
    }
}

impl From<FulfilmentError> for OrderFlowError {
    fn from(e: FulfilmentError) -> Self {
        match e {
            FulfilmentError::DatabaseError(s) => Self::DatabaseError(s),
            FulfilmentError::OrderNotFound(id) => Self::OrderNotFound(id),
        }
    }
}
