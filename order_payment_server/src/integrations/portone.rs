//! Binds the PortOne REST client to the engine's [`PaymentGateway`] seam.
use std::time::Duration;

use log::*;
use market_common::Price;
use order_payment_engine::{db_types::PaymentId, GatewayError, GatewayPayment, PaymentGateway};
use portone_tools::{PortOneApi, PortOneApiError, PortOneConfig, PortOnePayment};

#[derive(Clone)]
pub struct PortOneGateway {
    api: PortOneApi,
}

impl PortOneGateway {
    pub fn new(config: PortOneConfig) -> Result<Self, PortOneApiError> {
        let api = PortOneApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for PortOneGateway {
    async fn fetch_payment(&self, payment_id: &PaymentId, timeout: Duration) -> Result<GatewayPayment, GatewayError> {
        let payment = self.api.get_payment(payment_id.as_str(), timeout).await.map_err(|e| {
            warn!("💳️ PortOne lookup for payment {payment_id} failed. {e}");
            gateway_error(e, timeout)
        })?;
        Ok(gateway_payment(payment))
    }
}

fn gateway_payment(payment: PortOnePayment) -> GatewayPayment {
    match payment {
        PortOnePayment::Paid(paid) => GatewayPayment::paid(Price::from(paid.amount.total)),
        other => GatewayPayment::unpaid(other.status()),
    }
}

fn gateway_error(e: PortOneApiError, timeout: Duration) -> GatewayError {
    match e {
        PortOneApiError::Timeout(_) => GatewayError::Timeout(timeout),
        PortOneApiError::RestRequestError(s) | PortOneApiError::RestResponseError(s) => GatewayError::Transport(s),
        PortOneApiError::JsonError(s) => GatewayError::InvalidResponse(s),
        PortOneApiError::QueryError { status, message } => GatewayError::Rejected { status, message },
        PortOneApiError::Initialization(s) => GatewayError::Unexpected(s),
    }
}
