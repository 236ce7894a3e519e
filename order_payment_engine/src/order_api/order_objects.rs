use market_common::Price;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{Order, OrderItem, OrderStatusType, PaymentId},
    traits::GatewayError,
};

/// The answer to a validation request. `status` is always the status that is persisted once validation completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub order_id: i64,
    pub payment_id: PaymentId,
    pub status: OrderStatusType,
}

impl From<&Order> for ValidationResult {
    fn from(order: &Order) -> Self {
        Self { order_id: order.id, payment_id: order.payment_id.clone(), status: order.status }
    }
}

/// Why a payment was not accepted. Every variant leads to the order being marked `FAILED`.
#[derive(Debug, Clone, Error)]
pub enum PaymentRejection {
    #[error("The processor reported {reported}, but the order total is {expected}")]
    AmountMismatch { expected: Price, reported: Price },
    #[error("The processor reports the payment as {0}")]
    NotPaid(String),
    #[error("{0}")]
    GatewayUnavailable(#[from] GatewayError),
}

/// The result of a cancellation notification from the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The order was pending and is now cancelled.
    Cancelled(Order),
    AlreadyCancelled,
    /// The order has already settled in some other way. Nothing was changed.
    NotCancellable(OrderStatusType),
    /// No order carries this payment id. Nothing was changed.
    UnknownPayment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
