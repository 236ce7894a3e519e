use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderItem, PaymentId, StatusChange},
    order_lifecycle::{OrderEvent, TransitionRejected},
};

/// The result of applying an [`OrderEvent`] to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The order was in the expected status and has been moved. Contains the updated order.
    Applied(Order),
    /// The order was not in the status the event applies to, so nothing was written. Contains the order as it
    /// currently stands. This is the normal outcome when a concurrent writer got there first.
    Unchanged(Order),
}

impl TransitionOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// The persistence contract of the order payment engine.
///
/// Orders are never deleted. The order total is fixed at insertion. Status changes only ever happen through
/// [`OrderManagement::apply_order_event`], which must behave as an atomic compare-and-set on the current status.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Atomically stores the order header and all of its items with status `PENDING`. Either everything is written,
    /// or nothing is.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, OrderStoreError>;

    /// Returns the items of the order in the order in which they were submitted.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError>;

    /// Fetches all orders for the customer, oldest first.
    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies the event to the order identified by `payment_id`, if and only if the order is currently in
    /// [`OrderEvent::expected_status`]. The new status is given by
    /// [`next_status`](crate::order_lifecycle::next_status).
    ///
    /// When `PaymentConfirmed` is applied, the order's items are removed in the same transaction. If the order is not
    /// in the expected status, nothing is written and [`TransitionOutcome::Unchanged`] is returned.
    /// If there is no order with the given payment id, [`OrderStoreError::OrderNotFound`] is returned.
    async fn apply_order_event(
        &self,
        payment_id: &PaymentId,
        event: OrderEvent,
    ) -> Result<TransitionOutcome, OrderStoreError>;

    /// Fetches up to `limit` `PENDING` orders that have not been updated for at least `age`, oldest first.
    async fn fetch_stale_pending_orders(&self, age: Duration, limit: i64) -> Result<Vec<Order>, OrderStoreError>;

    /// Returns the status change log of the order, oldest first.
    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<StatusChange>, OrderStoreError>;

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since an order with payment id {0} already exists")]
    OrderAlreadyExists(PaymentId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(PaymentId),
    #[error("The order is invalid. {0}")]
    InvalidOrder(String),
    #[error("Illegal status transition. {0}")]
    IllegalTransition(#[from] TransitionRejected),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
