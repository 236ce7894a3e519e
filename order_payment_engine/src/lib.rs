//! Order Payment Engine
//!
//! The order payment engine reconciles marketplace orders with the payments made for them through PortOne. An order's
//! status is driven by two independent signals, a client asking for its payment to be validated and the payment
//! processor pushing notifications, and the engine merges them into one consistent result.
//!
//! The library is divided into the following sections:
//! 1. The backend contracts ([`mod@traits`]). [`OrderManagement`] is implemented by storage backends (currently
//!    SQLite, see [`SqliteDatabase`]). [`PaymentGateway`] is implemented by payment processor clients.
//! 2. The order status table ([`mod@order_lifecycle`]). Every status change is an [`order_lifecycle::OrderEvent`] that
//!    is only valid from one source status.
//! 3. The public API ([`OrderFlowApi`]), which opens orders, validates payments and applies cancellations.
//!
//! The engine also publishes settlement events that can be subscribed to through [`mod@events`]. For example, when an
//! order is paid, an `OrderPaidEvent` is emitted.
pub mod db_types;
pub mod events;
pub mod order_lifecycle;
pub mod traits;

mod order_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use order_api::{errors::OrderFlowError, order_flow_api::OrderFlowApi, order_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{GatewayError, GatewayPayment, OrderManagement, OrderStoreError, PaymentGateway, TransitionOutcome};
