//! # Order payment engine public API
//!
//! [`order_flow_api::OrderFlowApi`] drives an order from checkout to a final status. It is generic over a storage
//! backend implementing [`crate::traits::OrderManagement`] and a payment processor client implementing
//! [`crate::traits::PaymentGateway`].
//!
//! ```rust,ignore
//! use order_payment_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db, gateway, Duration::from_secs(15), producers);
//! let order = api.start_payment("alice", total, items).await?;
//! let result = api.validate_payment(&order.payment_id).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
