use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Amount, UserId},
    traits::PaymentOutcome,
};

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// The event types that the fulfilment flow reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
    /// Any other event type. These are acknowledged and otherwise ignored.
    Other(String),
}

impl From<&str> for PaymentEventKind {
    fn from(value: &str) -> Self {
        match value {
            PAYMENT_SUCCEEDED => Self::Succeeded,
            PAYMENT_FAILED => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for PaymentEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "{PAYMENT_SUCCEEDED}"),
            Self::Failed => write!(f, "{PAYMENT_FAILED}"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// The fields common to every event, whatever its type. Events are parsed in two steps: the envelope first, and the
/// full [`PaymentEvent`] only for the types that the fulfilment flow handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl EventEnvelope {
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from(self.event_type.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentObject {
    /// The payment intent id. This is the payment reference for the resulting order.
    pub id: String,
    pub amount: Amount,
    pub currency: String,
    #[serde(default)]
    pub metadata: EventMetadata,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentData {
    pub object: PaymentIntentObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentIntentData,
}

impl PaymentEvent {
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from(self.event_type.as_str())
    }

    pub fn payment_reference(&self) -> &str {
        &self.data.object.id
    }

    /// The user the payment was made for, taken from the metadata attached at checkout.
    pub fn user_id(&self) -> Option<UserId> {
        self.data
            .object
            .metadata
            .user_id
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(UserId::from)
    }

    pub fn payment_method_type(&self) -> &str {
        self.data.object.payment_method_types.first().map(String::as_str).unwrap_or("unknown")
    }

    /// Extracts the payment facts needed to record an order. Returns `None` if the event is not attributed to a user.
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        let user_id = self.user_id()?;
        Some(PaymentOutcome {
            user_id,
            payment_reference: self.payment_reference().to_string(),
            event_id: self.id.clone(),
            amount: self.data.object.amount,
            currency: self.data.object.currency.to_lowercase(),
            payment_method_type: self.payment_method_type().to_string(),
        })
    }
}
