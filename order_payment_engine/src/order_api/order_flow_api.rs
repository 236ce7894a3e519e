use std::{any::Any, fmt::Debug, panic::AssertUnwindSafe, time::Duration};

use futures_util::FutureExt;
use log::*;
use market_common::Price;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderStatusType, PaymentId, StatusChange},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    order_api::{
        errors::OrderFlowError,
        order_objects::{CancelOutcome, OrderWithItems, PaymentRejection, ValidationResult},
    },
    order_lifecycle::OrderEvent,
    traits::{GatewayError, GatewayPayment, OrderManagement, OrderStoreError, PaymentGateway, TransitionOutcome},
};

/// `OrderFlowApi` is the primary API for the order payment flow. It opens orders, reconciles them against the payment
/// processor, and applies processor cancellations.
///
/// All status changes go through [`OrderManagement::apply_order_event`], so the validation path and the webhook path
/// can race freely on the same order and at most one of them wins.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    gateway_timeout: Duration,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (gateway timeout {:?})", self.gateway_timeout)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, gateway_timeout: Duration, producers: EventProducers) -> Self {
        Self { db, gateway, gateway_timeout, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway_timeout(&self) -> Duration {
        self.gateway_timeout
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Opens a new `PENDING` order for `customer_id` under a freshly generated payment id.
    ///
    /// No call is made to the payment processor. The client uses the returned payment id to open the processor's
    /// checkout, and calls [`Self::validate_payment`] once the checkout completes.
    pub async fn start_payment(
        &self,
        customer_id: &str,
        total_price: Price,
        items: Vec<NewOrderItem>,
    ) -> Result<Order, OrderFlowError> {
        let order = NewOrder::new(customer_id, total_price, items);
        order.validate().map_err(OrderFlowError::InvalidOrder)?;
        let order = self.db.insert_order(order).await?;
        info!(
            "💳️ Order {} opened for customer {customer_id} with a total of {}",
            order.payment_id, order.total_price
        );
        Ok(order)
    }

    /// Reconciles the order with the payment processor's view of the payment.
    ///
    /// * Orders that are already `PAID`, `CANCELED` or `REFUNDED` are returned as they are. The processor is not
    ///   consulted.
    /// * Otherwise, the processor is asked for the payment. If it reports the payment as paid, for exactly the order
    ///   total, the order becomes `PAID` and its items are cleared. In every other case (unpaid, a different amount,
    ///   an error, a timeout or a panic in the client) the order becomes `FAILED` and its items are kept.
    ///
    /// If another writer settled the order while the processor was being queried, their result stands and is what is
    /// returned.
    pub async fn validate_payment(&self, payment_id: &PaymentId) -> Result<ValidationResult, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(payment_id.clone()))?;
        if order.status.is_settled() {
            debug!("💳️ Order {payment_id} is already {}. Not consulting the payment processor.", order.status);
            return Ok(ValidationResult::from(&order));
        }
        let response = self.query_gateway(payment_id).await;
        let event = match assess_payment(&order, response) {
            Ok(()) => {
                debug!("💳️ Payment {payment_id} confirmed for {}", order.total_price);
                OrderEvent::PaymentConfirmed
            },
            Err(reason) => {
                warn!("💳️ Payment {payment_id} was not accepted. {reason}");
                OrderEvent::PaymentRejected
            },
        };
        let outcome = self.db.apply_order_event(payment_id, event).await?;
        match &outcome {
            TransitionOutcome::Applied(order) => {
                info!("💳️ Order {payment_id} is now {}", order.status);
                self.notify_settlement(order).await;
            },
            TransitionOutcome::Unchanged(order) => {
                info!(
                    "💳️ Order {payment_id} was settled as {} by a concurrent update. Keeping that result.",
                    order.status
                );
            },
        }
        Ok(ValidationResult::from(outcome.order()))
    }

    /// Applies a cancellation reported by the payment processor.
    ///
    /// Only a `PENDING` order can be cancelled. Unknown payment ids and orders that are already cancelled are
    /// acknowledged without any change, so that redelivered notifications are harmless.
    pub async fn cancel_payment(&self, payment_id: &PaymentId) -> Result<CancelOutcome, OrderFlowError> {
        let Some(order) = self.db.fetch_order_by_payment_id(payment_id).await? else {
            info!("💳️ Cancellation received for unknown payment {payment_id}. Ignoring it.");
            return Ok(CancelOutcome::UnknownPayment);
        };
        if order.status == OrderStatusType::Canceled {
            debug!("💳️ Order {payment_id} is already cancelled. Ignoring the repeated cancellation.");
            return Ok(CancelOutcome::AlreadyCancelled);
        }
        match self.db.apply_order_event(payment_id, OrderEvent::CancelledByProcessor).await {
            Ok(TransitionOutcome::Applied(order)) => {
                info!("💳️ Order {payment_id} has been cancelled by the payment processor");
                self.notify_settlement(&order).await;
                Ok(CancelOutcome::Cancelled(order))
            },
            Ok(TransitionOutcome::Unchanged(order)) if order.status == OrderStatusType::Canceled => {
                Ok(CancelOutcome::AlreadyCancelled)
            },
            Ok(TransitionOutcome::Unchanged(order)) => {
                warn!(
                    "💳️ The payment processor cancelled payment {payment_id}, but the order is {}. The order has not \
                     been changed and may need manual attention.",
                    order.status
                );
                Ok(CancelOutcome::NotCancellable(order.status))
            },
            Err(OrderStoreError::OrderNotFound(_)) => Ok(CancelOutcome::UnknownPayment),
            Err(e) => Err(e.into()),
        }
    }

    /// Validates up to `limit` orders that have been left `PENDING` for at least `age`.
    ///
    /// Errors on individual orders are logged and skipped. Returns the results of the validations that completed.
    pub async fn reconcile_stale_orders(
        &self,
        age: chrono::Duration,
        limit: i64,
    ) -> Result<Vec<ValidationResult>, OrderFlowError> {
        let stale = self.db.fetch_stale_pending_orders(age, limit).await?;
        if stale.is_empty() {
            trace!("💳️ No stale pending orders to reconcile");
            return Ok(Vec::new());
        }
        debug!("💳️ Reconciling {} stale pending orders", stale.len());
        let mut results = Vec::with_capacity(stale.len());
        for order in stale {
            match self.validate_payment(&order.payment_id).await {
                Ok(result) => results.push(result),
                Err(e) => error!("💳️ Could not reconcile order {}. {e}", order.payment_id),
            }
        }
        Ok(results)
    }

    /// Returns all orders the customer has opened, oldest first, together with their remaining items.
    pub async fn fetch_order_history(&self, customer_id: &str) -> Result<Vec<OrderWithItems>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_customer(customer_id).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.db.fetch_order_items(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    pub async fn fetch_status_history(&self, payment_id: &PaymentId) -> Result<Vec<StatusChange>, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(payment_id.clone()))?;
        let history = self.db.fetch_status_history(order.id).await?;
        Ok(history)
    }

    /// Asks the payment processor for the payment, bounded by the gateway timeout. A panic inside the client is
    /// contained and reported as [`GatewayError::Unexpected`].
    async fn query_gateway(&self, payment_id: &PaymentId) -> Result<GatewayPayment, GatewayError> {
        let call = AssertUnwindSafe(self.gateway.fetch_payment(payment_id, self.gateway_timeout)).catch_unwind();
        match tokio::time::timeout(self.gateway_timeout, call).await {
            Err(_) => Err(GatewayError::Timeout(self.gateway_timeout)),
            Ok(Err(panic)) => Err(GatewayError::Unexpected(panic_message(panic.as_ref()))),
            Ok(Ok(result)) => result,
        }
    }

    async fn notify_settlement(&self, order: &Order) {
        match order.status {
            OrderStatusType::Paid => {
                for emitter in &self.producers.order_paid_producer {
                    debug!("💳️ Notifying order paid hook subscribers");
                    emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
                }
            },
            OrderStatusType::Failed | OrderStatusType::Canceled => {
                for emitter in &self.producers.order_annulled_producer {
                    debug!("💳️ Notifying order annulled hook subscribers");
                    emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
                }
            },
            OrderStatusType::Pending | OrderStatusType::Refunded => {},
        }
    }
}

/// Decides whether the processor's answer is proof of payment for `order`.
fn assess_payment(order: &Order, response: Result<GatewayPayment, GatewayError>) -> Result<(), PaymentRejection> {
    match response? {
        GatewayPayment::Paid { amount_total } if amount_total == order.total_price => Ok(()),
        GatewayPayment::Paid { amount_total } => {
            Err(PaymentRejection::AmountMismatch { expected: order.total_price, reported: amount_total })
        },
        GatewayPayment::Unpaid { status } => Err(PaymentRejection::NotPaid(status)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("The payment processor client panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("The payment processor client panicked: {s}")
    } else {
        "The payment processor client panicked".to_string()
    }
}
