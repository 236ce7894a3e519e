use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use market_common::Price;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------       PaymentId       ---------------------------------------------------------
/// The externally visible correlation key between an order and a PortOne payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    /// Generates a fresh, collision-negligible payment id.
    pub fn random() -> Self {
        Self(format!("pay-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaymentId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been opened and no decision about the payment has been made yet.
    Pending,
    /// The payment processor confirmed the payment, and the amount matched the order total.
    Paid,
    /// The payment could not be confirmed (not paid, amount mismatch, or the processor could not be reached).
    Failed,
    /// The payment processor reported that the payment was cancelled.
    Canceled,
    /// A paid order whose payment has been returned to the customer.
    Refunded,
}

impl OrderStatusType {
    /// Statuses for which `validate` will not consult the payment processor again.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Canceled | Self::Refunded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to FAILED");
            OrderStatusType::Failed
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "CANCELED" => Ok(Self::Canceled),
            "REFUNDED" => Ok(Self::Refunded),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub payment_id: PaymentId,
    pub customer_id: String,
    pub total_price: Price,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        ---------------------------------------------------------
/// A line item of an order. Name and price are snapshots taken when the order was opened, so later catalog edits do
/// not alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub position: i64,
    pub product_id: i64,
    pub cart_id: Option<i64>,
    pub product_name: String,
    pub product_price: Price,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    /// The shopping cart entry this item was checked out from, if any
    pub cart_id: Option<i64>,
    pub product_name: String,
    pub product_price: Price,
    pub quantity: i64,
}

impl NewOrderItem {
    pub fn new(product_id: i64, product_name: &str, product_price: Price, quantity: i64) -> Self {
        Self { product_id, cart_id: None, product_name: product_name.to_string(), product_price, quantity }
    }

    pub fn with_cart_id(mut self, cart_id: i64) -> Self {
        self.cart_id = Some(cart_id);
        self
    }

    pub fn line_total(&self) -> Price {
        self.product_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub payment_id: PaymentId,
    /// The id of the authenticated user who opened the order
    pub customer_id: String,
    /// The total agreed at checkout. This is the amount the payment processor must report.
    pub total_price: Price,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Creates a new order with a freshly generated payment id.
    pub fn new(customer_id: &str, total_price: Price, items: Vec<NewOrderItem>) -> Self {
        Self { payment_id: PaymentId::random(), customer_id: customer_id.to_string(), total_price, items }
    }

    /// Structural checks that must pass before an order is written.
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_id.trim().is_empty() {
            return Err("The order has no customer".to_string());
        }
        if !self.total_price.is_positive() {
            return Err(format!("The order total must be positive, but was {}", self.total_price));
        }
        if self.items.is_empty() {
            return Err("An order must contain at least one item".to_string());
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.product_id <= 0 {
                return Err(format!("Item {i} refers to an invalid product id ({})", item.product_id));
            }
            if item.product_name.trim().is_empty() {
                return Err(format!("Item {i} (product {}) has no name", item.product_id));
            }
            if item.product_price.is_negative() {
                return Err(format!("Item {i} (product {}) has a negative price", item.product_id));
            }
            if item.quantity <= 0 {
                return Err(format!("Item {i} (product {}) has a non-positive quantity", item.product_id));
            }
        }
        Ok(())
    }

    pub fn items_total(&self) -> Price {
        self.items.iter().map(NewOrderItem::line_total).sum()
    }
}

//--------------------------------------     StatusChange      ---------------------------------------------------------
/// An entry in the append-only order status log.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: i64,
    pub order_id: i64,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub changed_at: DateTime<Utc>,
}
