use thiserror::Error;

use crate::{db_types::PaymentId, traits::OrderStoreError};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The order with payment id {0} does not exist")]
    OrderNotFound(PaymentId),
    #[error("The order request is invalid. {0}")]
    InvalidOrder(String),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(pid) => Self::OrderNotFound(pid),
            OrderStoreError::InvalidOrder(msg) => Self::InvalidOrder(msg),
            OrderStoreError::OrderAlreadyExists(pid) => {
                Self::DatabaseError(format!("Payment id {pid} collided with an existing order"))
            },
            OrderStoreError::DatabaseError(msg) => Self::DatabaseError(msg),
            OrderStoreError::IllegalTransition(e) => Self::DatabaseError(e.to_string()),
        }
    }
}
