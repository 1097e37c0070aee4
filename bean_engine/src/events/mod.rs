//! Notifications sent by the payment processor.
//!
//! These types mirror the subset of the processor's JSON event format that the fulfilment flow needs. A
//! [`PaymentEvent`] must only ever be built from a [`crate::helpers::VerifiedPayload`].
mod payment_events;

pub use payment_events::{
    EventEnvelope,
    EventMetadata,
    PaymentEvent,
    PaymentEventKind,
    PaymentIntentData,
    PaymentIntentObject,
    PAYMENT_FAILED,
    PAYMENT_SUCCEEDED,
};
