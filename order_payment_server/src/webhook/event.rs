use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WebhookError;

/// The only webhook type that changes an order.
pub const TRANSACTION_CANCELLED: &str = "Transaction.Cancelled";

/// A PortOne webhook payload. Fields other than `type` and `data.paymentId` are carried for logging only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEventData {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
    }

    pub fn is_cancellation(&self) -> bool {
        self.event_type == TRANSACTION_CANCELLED
    }

    /// The payment id of a cancellation event. Cancellations that do not name a payment are malformed.
    pub fn cancelled_payment_id(&self) -> Result<&str, WebhookError> {
        self.data
            .payment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| WebhookError::MalformedPayload("The cancellation does not name a paymentId".to_string()))
    }
}
