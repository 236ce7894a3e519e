use std::{sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use market_common::Secret;
use mockall::predicate::eq;
use order_payment_engine::{
    db_types::{OrderStatusType, PaymentId},
    order_lifecycle::OrderEvent,
    OrderStoreError,
    TransitionOutcome,
};

use super::{
    helpers::{flow_api, order, send_request},
    mocks::{MockGateway, MockOrderStore},
};
use crate::{
    routes::PortoneWebhookRoute,
    webhook::{
        WebhookSignatureMiddlewareFactory,
        WebhookVerifier,
        WEBHOOK_ID_HEADER,
        WEBHOOK_SIGNATURE_HEADER,
        WEBHOOK_TIMESTAMP_HEADER,
    },
};

// base64("endpoint tests webhook key")
const WEBHOOK_SECRET: &str = "whsec_ZW5kcG9pbnQgdGVzdHMgd2ViaG9vayBrZXk=";

const CANCEL_PAY_1: &str = concat!(
    r#"{"type":"Transaction.Cancelled","timestamp":"2024-10-18T07:12:31.000Z","#,
    r#""data":{"paymentId":"pay-1","transactionId":"tx-1","storeId":"store-1"}}"#
);

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(&Secret::new(WEBHOOK_SECRET.to_string()), Duration::from_secs(300)).unwrap()
}

fn configure(store: MockOrderStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(flow_api(store, MockGateway::new()))).service(
            web::scope("/webhook-portone")
                .wrap(WebhookSignatureMiddlewareFactory::new(Arc::new(verifier())))
                .service(PortoneWebhookRoute::<MockOrderStore, MockGateway>::new()),
        );
    }
}

fn delivery(body: &str, timestamp: i64) -> TestRequest {
    let ts = timestamp.to_string();
    let signature = verifier().sign("msg_2bTGz", &ts, body.as_bytes()).unwrap();
    TestRequest::post()
        .uri("/webhook-portone")
        .insert_header((WEBHOOK_ID_HEADER, "msg_2bTGz"))
        .insert_header((WEBHOOK_TIMESTAMP_HEADER, ts))
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body.to_string())
}

fn store_untouched() -> MockOrderStore {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().never();
    store.expect_apply_order_event().never();
    store
}

#[actix_web::test]
async fn cancellation_is_applied() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_payment_id()
        .with(eq(PaymentId::from("pay-1")))
        .returning(|_| Ok(Some(order(1, "pay-1", OrderStatusType::Pending))));
    store
        .expect_apply_order_event()
        .with(eq(PaymentId::from("pay-1")), eq(OrderEvent::CancelledByProcessor))
        .times(1)
        .returning(|_, _| Ok(TransitionOutcome::Applied(order(1, "pay-1", OrderStatusType::Canceled))));
    let (status, body) = send_request(delivery(CANCEL_PAY_1, Utc::now().timestamp()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn repeated_cancellation_is_a_no_op() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(1, "pay-1", OrderStatusType::Canceled))));
    store.expect_apply_order_event().never();
    let (status, body) = send_request(delivery(CANCEL_PAY_1, Utc::now().timestamp()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn cancellation_of_unknown_payment_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(None));
    store.expect_apply_order_event().never();
    let (status, _) = send_request(delivery(CANCEL_PAY_1, Utc::now().timestamp()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn cancellation_of_paid_order_changes_nothing() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(1, "pay-1", OrderStatusType::Paid))));
    store
        .expect_apply_order_event()
        .returning(|_, _| Ok(TransitionOutcome::Unchanged(order(1, "pay-1", OrderStatusType::Paid))));
    let (status, _) = send_request(delivery(CANCEL_PAY_1, Utc::now().timestamp()), configure(store)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn other_event_types_are_ignored() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"type":"Transaction.Paid","data":{"paymentId":"pay-1"}}"#;
    let (status, body) = send_request(delivery(body, Utc::now().timestamp()), configure(store_untouched())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn forged_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = delivery(CANCEL_PAY_1, Utc::now().timestamp())
        .insert_header((WEBHOOK_SIGNATURE_HEADER, "v1,Zm9yZ2VkIHNpZ25hdHVyZSBmb3IgdGVzdHM="));
    let (status, body) = send_request(req, configure(store_untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Webhook rejected. The webhook signature is invalid."}"#);
}

#[actix_web::test]
async fn non_canonical_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let ts = Utc::now().timestamp().to_string();
    let signature = verifier().sign("msg_2bTGz", &ts, CANCEL_PAY_1.as_bytes()).unwrap();
    let req = delivery(CANCEL_PAY_1, Utc::now().timestamp())
        .insert_header((WEBHOOK_TIMESTAMP_HEADER, ts))
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature.trim_end_matches('=').to_string()));
    let (status, body) = send_request(req, configure(store_untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Webhook rejected. The webhook signature is invalid."}"#);
}

#[actix_web::test]
async fn tampered_body_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = delivery(CANCEL_PAY_1, Utc::now().timestamp()).set_payload(CANCEL_PAY_1.replace("pay-1", "pay-2"));
    let (status, _) = send_request(req, configure(store_untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn stale_delivery_is_rejected_before_signature_check() {
    let _ = env_logger::try_init().ok();
    let req = delivery(CANCEL_PAY_1, Utc::now().timestamp() - 600)
        .insert_header((WEBHOOK_SIGNATURE_HEADER, "v1,Zm9yZ2VkIHNpZ25hdHVyZSBmb3IgdGVzdHM="));
    let (status, body) = send_request(req, configure(store_untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("outside the permitted window"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn missing_headers_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/webhook-portone").set_payload(CANCEL_PAY_1);
    let (status, body) = send_request(req, configure(store_untouched())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("webhook-id"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn malformed_payload_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send_request(delivery("{not json", Utc::now().timestamp()), configure(store_untouched())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = r#"{"type":"Transaction.Cancelled","data":{}}"#;
    let (status, _) = send_request(delivery(body, Utc::now().timestamp()), configure(store_untouched())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn store_failure_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_order_by_payment_id()
        .returning(|_| Err(OrderStoreError::DatabaseError("database is locked".into())));
    let (status, _) = send_request(delivery(CANCEL_PAY_1, Utc::now().timestamp()), configure(store)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
