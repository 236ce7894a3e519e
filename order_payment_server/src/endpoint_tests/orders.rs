use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use market_common::Price;
use mockall::predicate::eq;
use order_payment_engine::{
    db_types::{NewOrder, Order, OrderItem, OrderStatusType, PaymentId},
    order_lifecycle::OrderEvent,
    GatewayError,
    GatewayPayment,
    OrderStoreError,
    TransitionOutcome,
};
use serde_json::{json, Value};

use super::{
    helpers::{flow_api, issue_token, order, send_request},
    mocks::{MockGateway, MockOrderStore},
};
use crate::routes::{OrderHistoryRoute, StartPaymentRoute, ValidatePaymentRoute};

fn configure(store: MockOrderStore, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(flow_api(store, gateway)))
            .service(StartPaymentRoute::<MockOrderStore, MockGateway>::new())
            .service(ValidatePaymentRoute::<MockOrderStore, MockGateway>::new())
            .service(OrderHistoryRoute::<MockOrderStore, MockGateway>::new());
    }
}

fn start_request(token: Option<&str>, body: Value) -> TestRequest {
    let mut req = TestRequest::post().uri("/order/start").set_json(body);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    req
}

fn valid_start_body() -> Value {
    json!({
        "total_price": 10000,
        "orderItems": [
            { "product_id": 4, "cart_id": 17, "product_name": "Soy sauce", "product_price": 3000, "quantity": 2 },
            { "product_id": 9, "product_name": "Sesame oil", "product_price": 4000, "quantity": 1 }
        ]
    })
}

fn saved(new_order: NewOrder) -> Order {
    let mut saved = order(7, new_order.payment_id.as_str(), OrderStatusType::Pending);
    saved.customer_id = new_order.customer_id;
    saved.total_price = new_order.total_price;
    saved
}

fn validate_request(payment_id: &str) -> TestRequest {
    TestRequest::post().uri("/order/validation").set_json(json!({ "paymentId": payment_id }))
}

#[actix_web::test]
async fn start_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store
        .expect_insert_order()
        .withf(|o: &NewOrder| {
            o.customer_id == "alice" &&
                o.total_price == Price::from(10_000) &&
                o.items.len() == 2 &&
                o.items[0].cart_id == Some(17) &&
                o.items[1].cart_id.is_none()
        })
        .times(1)
        .returning(|o| Ok(saved(o)));
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = start_request(Some(&token), valid_start_body());
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "PENDING");
    assert!(body["paymentId"].as_str().unwrap().starts_with("pay-"));
}

#[actix_web::test]
async fn start_payment_without_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let req = start_request(None, valid_start_body());
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided."}"#);
}

#[actix_web::test]
async fn start_payment_with_expired_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let token = issue_token("alice", Utc::now() - Duration::minutes(5));
    let req = start_request(Some(&token), valid_start_body());
    let (status, _) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn start_payment_with_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let mut token = issue_token("alice", Utc::now() + Duration::hours(1));
    token.replace_range(token.len() - 10..token.len() - 5, "AAAAA");
    let req = start_request(Some(&token), valid_start_body());
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn start_payment_with_no_items() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = start_request(Some(&token), json!({ "total_price": 10000, "orderItems": [] }));
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one item"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn start_payment_with_missing_fields() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = start_request(Some(&token), json!({ "orderItems": [] }));
    let (status, _) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn start_payment_when_store_is_down() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_insert_order().returning(|_| Err(OrderStoreError::DatabaseError("disk I/O error".into())));
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = start_request(Some(&token), valid_start_body());
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("disk I/O error"));
}

#[actix_web::test]
async fn validate_unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().with(eq(PaymentId::from("pay-nope"))).returning(|_| Ok(None));
    store.expect_apply_order_event().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let (status, _) = send_request(validate_request("pay-nope"), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn validate_paid_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(3, "pay-3", OrderStatusType::Pending))));
    store
        .expect_apply_order_event()
        .with(eq(PaymentId::from("pay-3")), eq(OrderEvent::PaymentConfirmed))
        .times(1)
        .returning(|_, _| Ok(TransitionOutcome::Applied(order(3, "pay-3", OrderStatusType::Paid))));
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().times(1).returning(|_, _| Ok(GatewayPayment::paid(Price::from(10_000))));
    let (status, body) = send_request(validate_request("pay-3"), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":3,"status":"PAID"}"#);
}

#[actix_web::test]
async fn validate_underpaid_payment() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(3, "pay-3", OrderStatusType::Pending))));
    store
        .expect_apply_order_event()
        .with(eq(PaymentId::from("pay-3")), eq(OrderEvent::PaymentRejected))
        .times(1)
        .returning(|_, _| Ok(TransitionOutcome::Applied(order(3, "pay-3", OrderStatusType::Failed))));
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_, _| Ok(GatewayPayment::paid(Price::from(9_999))));
    let (status, body) = send_request(validate_request("pay-3"), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":3,"status":"FAILED"}"#);
}

#[actix_web::test]
async fn validate_when_gateway_is_down() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(3, "pay-3", OrderStatusType::Pending))));
    store
        .expect_apply_order_event()
        .with(eq(PaymentId::from("pay-3")), eq(OrderEvent::PaymentRejected))
        .times(1)
        .returning(|_, _| Ok(TransitionOutcome::Applied(order(3, "pay-3", OrderStatusType::Failed))));
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().returning(|_, _| Err(GatewayError::Transport("connection refused".into())));
    let (status, body) = send_request(validate_request("pay-3"), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":3,"status":"FAILED"}"#);
}

#[actix_web::test]
async fn validate_settled_order_skips_gateway() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_payment_id().returning(|_| Ok(Some(order(3, "pay-3", OrderStatusType::Canceled))));
    store.expect_apply_order_event().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let (status, body) = send_request(validate_request("pay-3"), configure(store, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"order_id":3,"status":"CANCELED"}"#);
}

#[actix_web::test]
async fn order_history() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_orders_for_customer().withf(|c: &str| c == "alice").returning(|_| {
        Ok(vec![order(1, "pay-1", OrderStatusType::Paid), order(2, "pay-2", OrderStatusType::Pending)])
    });
    store.expect_fetch_order_items().with(eq(1)).returning(|_| Ok(vec![]));
    store.expect_fetch_order_items().with(eq(2)).returning(|order_id| {
        Ok(vec![OrderItem {
            id: 11,
            order_id,
            position: 0,
            product_id: 4,
            cart_id: Some(17),
            product_name: "Soy sauce".into(),
            product_price: Price::from(5_000),
            quantity: 2,
            created_at: Utc::now(),
        }])
    });
    let token = issue_token("alice", Utc::now() + Duration::hours(1));
    let req = TestRequest::get().uri("/order/history").insert_header(("Authorization", format!("Bearer {token}")));
    let (status, body) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["payment_id"], "pay-1");
    assert_eq!(orders[0]["status"], "PAID");
    assert!(orders[0]["items"].as_array().unwrap().is_empty());
    assert_eq!(orders[1]["items"][0]["product_name"], "Soy sauce");
    assert_eq!(orders[1]["items"][0]["quantity"], 2);
}

#[actix_web::test]
async fn order_history_requires_token() {
    let _ = env_logger::try_init().ok();
    let mut store = MockOrderStore::new();
    store.expect_fetch_orders_for_customer().never();
    let req = TestRequest::get().uri("/order/history");
    let (status, _) = send_request(req, configure(store, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
