//! # PortOne tools
//!
//! A thin REST client for the [PortOne V2 API](https://developers.portone.io/api/rest-v2). Only the endpoints that the
//! order payment server needs are wrapped. The client knows nothing about orders or the order state machine;
//! callers interpret the returned [`PortOnePayment`] records themselves.
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::PortOneApi;
pub use config::PortOneConfig;
pub use data_objects::{PaidPayment, PaymentAmount, PortOnePayment};
pub use error::PortOneApiError;
