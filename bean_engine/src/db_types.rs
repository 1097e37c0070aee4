use std::{fmt::Display, str::FromStr};

pub use bean_common::Amount;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        UserId         ---------------------------------------------------------
/// The opaque identity of an authenticated user (the `sub` claim of their access token).
///
/// Ownership of beans, carts, orders and profiles is always expressed in terms of a `UserId` that came from a
/// verified source: the bearer token for API calls, or the signed payment metadata for webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// A truncated form of the id that is safe to write to logs.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((i, _)) => &self.0[..i],
            None => &self.0,
        }
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------         Bean          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Bean {
    pub id: i64,
    pub name: String,
    pub origin: String,
    pub price: Amount,
    pub process: String,
    pub roast_profile: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewBean        ---------------------------------------------------------
/// The user-supplied fields of a catalog listing. The owner is never part of this struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBean {
    pub name: String,
    pub origin: String,
    pub price: Amount,
    #[serde(default)]
    pub process: String,
    #[serde(default)]
    pub roast_profile: String,
}

impl NewBean {
    pub fn new<S: Into<String>>(name: S, origin: S, price: Amount) -> Self {
        Self { name: name.into(), origin: origin.into(), price, ..Default::default() }
    }

    pub fn with_process<S: Into<String>>(mut self, process: S) -> Self {
        self.process = process.into();
        self
    }

    pub fn with_roast_profile<S: Into<String>>(mut self, roast_profile: S) -> Self {
        self.roast_profile = roast_profile.into();
        self
    }
}

//--------------------------------------       BeanUpdate      ---------------------------------------------------------
/// A partial update to a listing. Fields that are `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanUpdate {
    pub name: Option<String>,
    pub origin: Option<String>,
    pub price: Option<Amount>,
    pub process: Option<String>,
    pub roast_profile: Option<String>,
}

impl BeanUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.origin.is_none() &&
            self.price.is_none() &&
            self.process.is_none() &&
            self.roast_profile.is_none()
    }

    pub fn with_price(mut self, price: Amount) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

//--------------------------------------         Cart          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       CartItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub bean_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    CartItemDetail     ---------------------------------------------------------
/// A cart line joined with the current catalog data for its bean.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItemDetail {
    pub id: i64,
    pub bean_id: i64,
    pub name: String,
    pub price: Amount,
    pub quantity: i64,
    pub process: String,
    pub roast_profile: String,
}

impl CartItemDetail {
    /// `price × quantity`, or `None` if that overflows.
    pub fn line_total(&self) -> Option<Amount> {
        self.price.checked_mul(self.quantity)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The payment went through and the cart was converted into this order.
    Succeeded,
    /// The payment was declined. The order is kept for auditing only; the cart is untouched.
    Failed,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Succeeded => write!(f, "succeeded"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Failed");
            OrderStatusType::Failed
        })
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: UserId,
    pub status: OrderStatusType,
    pub total_amount: Amount,
    pub currency: String,
    pub payment_method_type: String,
    /// The processor's id for the payment intent. At most one succeeded order exists per reference.
    pub payment_reference: String,
    /// The id of the notification that created this order.
    pub source_event_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatusType,
    /// The amount the processor actually charged. This, not the cart sum, is what gets recorded.
    pub total_amount: Amount,
    pub currency: String,
    pub payment_method_type: String,
    pub payment_reference: String,
    pub source_event_id: String,
}

impl NewOrder {
    pub fn new<S: Into<String>>(
        user_id: UserId,
        status: OrderStatusType,
        total_amount: Amount,
        payment_reference: S,
        source_event_id: S,
    ) -> Self {
        Self {
            user_id,
            status,
            total_amount,
            currency: bean_common::DEFAULT_CURRENCY_CODE.to_string(),
            payment_method_type: "unknown".to_string(),
            payment_reference: payment_reference.into(),
            source_event_id: source_event_id.into(),
        }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_payment_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method_type = method.into();
        self
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub bean_id: i64,
    /// The bean's price at the moment the order was materialized. Later price changes never touch this.
    pub price_at_purchase: Amount,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Amount> {
        self.price_at_purchase.checked_mul(self.quantity)
    }
}

//--------------------------------------        Profile        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub icon_url: Option<String>,
    pub post_code: Option<String>,
    pub address: Option<String>,
    pub about_me: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub display_name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub post_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub about_me: Option<String>,
}
