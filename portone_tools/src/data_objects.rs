use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payment record as returned by `GET /payments/{paymentId}`.
///
/// PortOne discriminates payment records on the `status` field. Only the `PAID` shape is modelled in detail, since it
/// is the only one that carries information the order server acts upon. Statuses that PortOne may add in future are
/// collected under [`PortOnePayment::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortOnePayment {
    Paid(PaidPayment),
    Ready,
    Pending,
    VirtualAccountIssued,
    Failed,
    PartialCancelled,
    Cancelled,
    #[serde(other)]
    Unrecognized,
}

impl PortOnePayment {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Paid(_) => "PAID",
            Self::Ready => "READY",
            Self::Pending => "PENDING",
            Self::VirtualAccountIssued => "VIRTUAL_ACCOUNT_ISSUED",
            Self::Failed => "FAILED",
            Self::PartialCancelled => "PARTIAL_CANCELLED",
            Self::Cancelled => "CANCELLED",
            Self::Unrecognized => "UNRECOGNIZED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidPayment {
    pub id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub order_name: Option<String>,
    pub amount: PaymentAmount,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAmount {
    /// The total amount charged, in the smallest currency unit.
    pub total: i64,
    #[serde(default)]
    pub tax_free: Option<i64>,
    #[serde(default)]
    pub discount: Option<i64>,
    #[serde(default)]
    pub paid: Option<i64>,
    #[serde(default)]
    pub cancelled: Option<i64>,
}

/// The error body PortOne returns alongside non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortOneErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paid_payment() {
        let json = r#"{
            "status": "PAID",
            "id": "pay-0001",
            "transactionId": "tx-81f2",
            "storeId": "store-1234",
            "orderName": "Kimchi starter kit",
            "amount": { "total": 10000, "taxFree": 0, "vat": 909, "discount": 0, "paid": 10000, "cancelled": 0 },
            "currency": "KRW",
            "paidAt": "2024-10-18T09:30:00Z"
        }"#;
        let payment: PortOnePayment = serde_json::from_str(json).unwrap();
        let PortOnePayment::Paid(paid) = &payment else { panic!("Expected a paid payment, got {payment:?}") };
        assert_eq!(paid.id, "pay-0001");
        assert_eq!(paid.amount.total, 10_000);
        assert_eq!(paid.currency.as_deref(), Some("KRW"));
        assert_eq!(payment.status(), "PAID");
    }

    #[test]
    fn unpaid_payments_ignore_extra_fields() {
        let json = r#"{"status": "READY", "id": "pay-0002", "amount": { "total": 5000 }}"#;
        let payment: PortOnePayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment, PortOnePayment::Ready);
        let json = r#"{"status": "CANCELLED", "id": "pay-0003", "cancellations": []}"#;
        let payment: PortOnePayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment, PortOnePayment::Cancelled);
    }

    #[test]
    fn unknown_statuses() {
        let json = r#"{"status": "PAY_PENDING", "id": "pay-0004"}"#;
        let payment: PortOnePayment = serde_json::from_str(json).unwrap();
        assert_eq!(payment, PortOnePayment::Unrecognized);
    }

    #[test]
    fn paid_without_amount_is_an_error() {
        let json = r#"{"status": "PAID", "id": "pay-0005"}"#;
        assert!(serde_json::from_str::<PortOnePayment>(json).is_err());
    }
}
