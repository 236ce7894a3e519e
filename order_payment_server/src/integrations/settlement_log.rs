use futures::future::BoxFuture;
use log::*;
use order_payment_engine::events::{EventHandlers, EventHooks, OrderAnnulledEvent, OrderPaidEvent};

pub const SETTLEMENT_EVENT_BUFFER_SIZE: usize = 25;

/// Event handlers that write an audit line for every settled order.
pub fn create_settlement_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(log_paid).on_order_annulled(log_annulled);
    EventHandlers::new(SETTLEMENT_EVENT_BUFFER_SIZE, hooks)
}

fn log_paid(ev: OrderPaidEvent) -> BoxFuture<'static, ()> {
    let OrderPaidEvent { order } = ev;
    Box::pin(async move {
        info!(
            "📬️ Order #{} ({}) for customer {} settled as PAID. Total: {}",
            order.id,
            order.payment_id,
            order.customer_id,
            order.total_price
        );
    })
}

fn log_annulled(ev: OrderAnnulledEvent) -> BoxFuture<'static, ()> {
    let OrderAnnulledEvent { order, status } = ev;
    Box::pin(async move {
        info!(
            "📬️ Order #{} ({}) for customer {} settled as {status}. Total: {}",
            order.id,
            order.payment_id,
            order.customer_id,
            order.total_price
        );
    })
}
