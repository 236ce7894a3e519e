//! # Order payment server
//! The HTTP boundary of the order payment engine. It is responsible for:
//! * Opening orders for authenticated customers before they are sent to the PortOne checkout.
//! * Validating completed checkouts against PortOne, and settling the order accordingly.
//! * Receiving PortOne webhooks and applying processor cancellations.
//! * Periodically reconciling checkouts that were abandoned before validation.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/order/start`: Opens a new order. Requires an access token.
//! * `/order/validation`: Validates the payment for an order.
//! * `/order/history`: The authenticated customer's orders. Requires an access token.
//! * `/webhook-portone`: The PortOne webhook endpoint. Deliveries must carry a valid signature.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod reconcile_worker;
pub mod routes;
pub mod server;
pub mod webhook;

#[cfg(test)]
mod endpoint_tests;
