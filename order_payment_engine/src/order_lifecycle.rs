//! Order status transitions.
//!
//! Every status change an order can undergo is described by an [`OrderEvent`]. An event is only valid from exactly one
//! source status, and always leads to exactly one target status:
//!
//! | Event                  | From      | To         |
//! |------------------------|-----------|------------|
//! | `PaymentConfirmed`     | `PENDING` | `PAID`     |
//! | `PaymentRejected`      | `PENDING` | `FAILED`   |
//! | `CancelledByProcessor` | `PENDING` | `CANCELED` |
//! | `Refunded`             | `PAID`    | `REFUNDED` |
//!
//! Anything else is rejected. In particular, `PAID`, `FAILED`, `CANCELED` and `REFUNDED` never return to `PENDING`.
//! [`next_status`] is the transition table. Storage backends apply it as a compare-and-set on the source status, so that
//! concurrent writers cannot both move the same order.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::OrderStatusType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEvent {
    /// The payment processor reported the payment as paid, for exactly the order total.
    PaymentConfirmed,
    /// The payment could not be confirmed.
    PaymentRejected,
    /// The payment processor notified us that the payment was cancelled.
    CancelledByProcessor,
    Refunded,
}

impl OrderEvent {
    /// The only status from which this event may be applied.
    pub fn expected_status(&self) -> OrderStatusType {
        match self {
            Self::PaymentConfirmed | Self::PaymentRejected | Self::CancelledByProcessor => OrderStatusType::Pending,
            Self::Refunded => OrderStatusType::Paid,
        }
    }
}

impl Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PaymentConfirmed => "PaymentConfirmed",
            Self::PaymentRejected => "PaymentRejected",
            Self::CancelledByProcessor => "CancelledByProcessor",
            Self::Refunded => "Refunded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{event} cannot be applied to an order with status {current}")]
pub struct TransitionRejected {
    pub current: OrderStatusType,
    pub event: OrderEvent,
}

/// Returns the status that `event` moves an order in status `current` to, or an error if the transition is not
/// allowed.
pub fn next_status(current: OrderStatusType, event: OrderEvent) -> Result<OrderStatusType, TransitionRejected> {
    use OrderStatusType::*;
    match (current, event) {
        (Pending, OrderEvent::PaymentConfirmed) => Ok(Paid),
        (Pending, OrderEvent::PaymentRejected) => Ok(Failed),
        (Pending, OrderEvent::CancelledByProcessor) => Ok(Canceled),
        (Paid, OrderEvent::Refunded) => Ok(Refunded),
        _ => Err(TransitionRejected { current, event }),
    }
}
