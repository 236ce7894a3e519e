use std::time::Duration;

use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, TimeZone, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;
use market_common::Price;
use order_payment_engine::{
    db_types::{Order, OrderStatusType, PaymentId},
    events::EventProducers,
    OrderFlowApi,
};

use super::mocks::{MockGateway, MockOrderStore};
use crate::{
    auth::{JwtClaims, TokenVerifier},
    config::AuthConfig,
};

// Signs test access tokens only. DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &[u8] = b"endpoint-tests-jwt-secret-0f3a9c";

pub fn issue_token(customer_id: &str, expiry: DateTime<Utc>) -> String {
    let header = Header::empty().with_token_type("JWT");
    let mut claims = Claims::new(JwtClaims { customer_id: customer_id.to_string() });
    claims.expiration = Some(expiry);
    Hs256.token(&header, &claims, &Hs256Key::new(TEST_JWT_SECRET)).expect("Failed to sign token")
}

pub fn flow_api(store: MockOrderStore, gateway: MockGateway) -> OrderFlowApi<MockOrderStore, MockGateway> {
    OrderFlowApi::new(store, gateway, Duration::from_secs(1), EventProducers::default())
}

pub fn order(id: i64, payment_id: &str, status: OrderStatusType) -> Order {
    let created_at = Utc.with_ymd_and_hms(2024, 10, 18, 9, 30, 0).unwrap();
    Order {
        id,
        payment_id: PaymentId::from(payment_id),
        customer_id: "alice".to_string(),
        total_price: Price::from(10_000),
        status,
        created_at,
        updated_at: created_at,
    }
}

/// Sends the request through an app built by `configure`, and returns the status and body of the response. Errors
/// raised by middleware are rendered the way the server would render them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let verifier = web::Data::new(TokenVerifier::new(&AuthConfig::new(TEST_JWT_SECRET)));
    let app = App::new().app_data(verifier).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.expect("Could not read error body");
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}
