use std::{fmt::Display, time::Duration};

use log::*;

use crate::{
    bme_api::errors::OrderFlowError,
    db_types::{Order, UserId},
    events::{EventEnvelope, PaymentEvent, PaymentEventKind},
    helpers::VerifiedPayload,
    traits::{FulfilmentDatabase, InsertOrderResult, MaterializeResult, OrderWithItems, PaymentOutcome},
};

/// The longest a single fulfilment transaction may run before it is abandoned and rolled back.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(10);

/// How a payment notification was handled. Every variant is a successful acknowledgement: the processor does not need
/// to send the notification again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAck {
    /// The cart was converted into this order.
    OrderCreated(OrderWithItems),
    /// The declined payment was recorded as a failed order.
    FailureRecorded(Order),
    /// This notification (or another one for the same payment) has already been handled.
    AlreadyProcessed,
    /// The payment succeeded, but there was nothing in the cart to fulfil.
    CartEmpty,
    /// The event type is not one this flow reacts to.
    Ignored(String),
}

impl Display for EventAck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderCreated(o) => write!(f, "Order #{} created", o.order.id),
            Self::FailureRecorded(o) => write!(f, "Payment failure recorded as order #{}", o.id),
            Self::AlreadyProcessed => write!(f, "Event already processed"),
            Self::CartEmpty => write!(f, "Cart is empty. No order was created"),
            Self::Ignored(t) => write!(f, "Event type {t} ignored"),
        }
    }
}

/// `OrderFlowApi` is the primary API for turning verified payment processor notifications into orders.
///
/// Notifications are delivered at least once, possibly concurrently and in any order. All the duplicate handling
/// lives in the backend's constraints, so this API holds no state of its own and can be shared freely between workers.
pub struct OrderFlowApi<B> {
    db: B,
    tx_timeout: Duration,
}

impl<B> std::fmt::Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (timeout: {:?})", self.tx_timeout)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, tx_timeout: DEFAULT_TX_TIMEOUT }
    }

    pub fn with_tx_timeout(mut self, timeout: Duration) -> Self {
        self.tx_timeout = timeout;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: FulfilmentDatabase
{
    /// Handles the body of a notification whose signature has already been verified.
    ///
    /// The envelope is parsed first, so that event types this flow does not handle are acknowledged even if their
    /// payload has a completely different shape.
    pub async fn process_notification(&self, payload: &VerifiedPayload) -> Result<EventAck, OrderFlowError> {
        let envelope = payload.parse::<EventEnvelope>().map_err(|e| OrderFlowError::MalformedEvent(e.to_string()))?;
        if let PaymentEventKind::Other(event_type) = envelope.kind() {
            trace!("🔄️ Ignoring event {} of type {event_type}", envelope.id);
            return Ok(EventAck::Ignored(event_type));
        }
        let event = payload.parse::<PaymentEvent>().map_err(|e| OrderFlowError::MalformedEvent(e.to_string()))?;
        self.dispatch(&event).await
    }

    /// Routes a payment event to the success or failure flow.
    ///
    /// Events of either kind must say which user they belong to. An unattributed payment is an error, never a silent
    /// success, so that it is surfaced for manual reconciliation.
    pub async fn dispatch(&self, event: &PaymentEvent) -> Result<EventAck, OrderFlowError> {
        let kind = event.kind();
        if let PaymentEventKind::Other(event_type) = kind {
            trace!("🔄️ Ignoring event {} of type {event_type}", event.id);
            return Ok(EventAck::Ignored(event_type));
        }
        let payment = event.outcome().ok_or_else(|| {
            warn!(
                "🔄️ Event {} ({kind}) for payment {} has no user id in its metadata. It cannot be attributed to a \
                 cart.",
                event.id,
                event.payment_reference()
            );
            OrderFlowError::MissingUserId(event.id.clone())
        })?;
        match kind {
            PaymentEventKind::Succeeded => self.process_payment_succeeded(&payment).await,
            PaymentEventKind::Failed => self.process_payment_failed(&payment).await,
            PaymentEventKind::Other(event_type) => Ok(EventAck::Ignored(event_type)),
        }
    }

    /// Converts the user's cart into an order for a successful payment.
    pub async fn process_payment_succeeded(&self, payment: &PaymentOutcome) -> Result<EventAck, OrderFlowError> {
        trace!("🔄️✅️ Payment {} succeeded for {}", payment.payment_reference, payment.user_id.short());
        let result = tokio::time::timeout(self.tx_timeout, self.db.materialize_order(payment)).await.map_err(|_| {
            let reference = &payment.payment_reference;
            error!("🔄️✅️ Fulfilment of payment {reference} timed out. It will be retried on redelivery.");
            OrderFlowError::Timeout(self.tx_timeout)
        })??;
        let ack = match result {
            MaterializeResult::Created(order) => {
                if !order.amount_matches() {
                    let items_total =
                        order.items_total().map_or_else(|| "more than can be represented".into(), |t| t.to_string());
                    error!(
                        "🔄️✅️ Order #{} for payment {}: the processor charged {} but the items add up to {}. The \
                         order has been recorded with the charged amount. Please review it manually.",
                        order.order.id, payment.payment_reference, order.order.total_amount, items_total
                    );
                }
                info!(
                    "🔄️✅️ Order #{} created for {} ({} {})",
                    order.order.id,
                    payment.user_id.short(),
                    order.order.total_amount,
                    order.order.currency
                );
                EventAck::OrderCreated(order)
            },
            MaterializeResult::AlreadyProcessed => {
                debug!("🔄️✅️ Payment {} was already fulfilled. Nothing to do.", payment.payment_reference);
                EventAck::AlreadyProcessed
            },
            MaterializeResult::CartEmpty => EventAck::CartEmpty,
        };
        Ok(ack)
    }

    /// Records a declined payment. The user's cart is left as it is, so that they can try again.
    pub async fn process_payment_failed(&self, payment: &PaymentOutcome) -> Result<EventAck, OrderFlowError> {
        trace!("🔄️❌️ Payment {} failed for {}", payment.payment_reference, payment.user_id.short());
        let result = tokio::time::timeout(self.tx_timeout, self.db.record_failed_order(payment))
            .await
            .map_err(|_| OrderFlowError::Timeout(self.tx_timeout))??;
        match result {
            InsertOrderResult::Inserted(order) => {
                info!(
                    "🔄️❌️ Payment {} for {} failed. Recorded as order #{}",
                    payment.payment_reference,
                    payment.user_id.short(),
                    order.order.id
                );
                Ok(EventAck::FailureRecorded(order.order))
            },
            InsertOrderResult::AlreadyExists => Ok(EventAck::AlreadyProcessed),
        }
    }

    pub async fn orders_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    /// The fulfilled order for a payment reference, if the payment has been fulfilled yet.
    pub async fn order_for_payment(&self, payment_reference: &str) -> Result<Option<OrderWithItems>, OrderFlowError> {
        let Some(order) = self.db.fetch_succeeded_order(payment_reference).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }
}
