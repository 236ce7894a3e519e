//! # Backend contracts
//!
//! The engine talks to the outside world through two seams:
//!
//! * [`OrderManagement`] is the persistence contract. Backends store orders and their items, and apply status
//!   transitions atomically.
//! * [`PaymentGateway`] gives read-only access to the payment processor's view of a payment.
//!
//! Both are traits so that the order flow can be exercised against fakes in tests.
mod order_management;
mod payment_gateway;

pub use order_management::{OrderManagement, OrderStoreError, TransitionOutcome};
pub use payment_gateway::{GatewayError, GatewayPayment, PaymentGateway};
