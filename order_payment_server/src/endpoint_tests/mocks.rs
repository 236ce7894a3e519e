use std::time::Duration;

use mockall::mock;
use order_payment_engine::{
    db_types::{NewOrder, Order, OrderItem, PaymentId, StatusChange},
    order_lifecycle::OrderEvent,
    GatewayError,
    GatewayPayment,
    OrderManagement,
    OrderStoreError,
    PaymentGateway,
    TransitionOutcome,
};

mock! {
    pub OrderStore {}
    impl Clone for OrderStore {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for OrderStore {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError>;
        async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderStoreError>;
        async fn apply_order_event(&self, payment_id: &PaymentId, event: OrderEvent) -> Result<TransitionOutcome, OrderStoreError>;
        async fn fetch_stale_pending_orders(&self, age: chrono::Duration, limit: i64) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<StatusChange>, OrderStoreError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn fetch_payment(&self, payment_id: &PaymentId, timeout: Duration) -> Result<GatewayPayment, GatewayError>;
    }
}
