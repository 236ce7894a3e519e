use std::time::Duration;

use market_common::Price;
use thiserror::Error;

use crate::db_types::PaymentId;

/// What the payment processor says about a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPayment {
    /// The payment has been completed for the given total.
    Paid { amount_total: Price },
    /// Any other status. `status` is the processor's own name for it and is only used for logging.
    Unpaid { status: String },
}

impl GatewayPayment {
    pub fn paid(amount_total: Price) -> Self {
        Self::Paid { amount_total }
    }

    pub fn unpaid<S: Into<String>>(status: S) -> Self {
        Self::Unpaid { status: status.into() }
    }
}

/// Read-only access to the payment processor's authoritative payment records.
///
/// Implementations must treat `timeout` as a hard upper bound on the call. The engine wraps every call in its own
/// deadline as well, so a slow implementation cannot hold up a validation indefinitely.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    async fn fetch_payment(&self, payment_id: &PaymentId, timeout: Duration) -> Result<GatewayPayment, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment processor did not respond within {0:?}")]
    Timeout(Duration),
    #[error("Could not reach the payment processor. {0}")]
    Transport(String),
    #[error("The payment processor sent a response we could not interpret. {0}")]
    InvalidResponse(String),
    #[error("The payment processor rejected the request with status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected payment processor failure. {0}")]
    Unexpected(String),
}
