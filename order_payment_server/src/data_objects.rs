use market_common::Price;
use order_payment_engine::db_types::{NewOrderItem, OrderStatusType, PaymentId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPaymentRequest {
    pub total_price: i64,
    #[serde(rename = "orderItems")]
    pub order_items: Vec<OrderItemRequest>,
}

/// A line item as sent by the storefront. Name and price are the catalog values at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: i64,
    #[serde(default)]
    pub cart_id: Option<i64>,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i64,
}

impl From<OrderItemRequest> for NewOrderItem {
    fn from(item: OrderItemRequest) -> Self {
        NewOrderItem {
            product_id: item.product_id,
            cart_id: item.cart_id,
            product_name: item.product_name,
            product_price: Price::from(item.product_price),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPaymentResponse {
    #[serde(rename = "paymentId")]
    pub payment_id: PaymentId,
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(rename = "paymentId")]
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub order_id: i64,
    pub status: OrderStatusType,
}
