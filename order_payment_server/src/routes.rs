//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//!
//! Handlers run on actix worker threads, one request at a time per worker. Anything that waits on I/O (the database,
//! PortOne) must be awaited, never blocked on, or the worker stops serving other requests for the duration.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_payment_engine::{
    db_types::{NewOrderItem, PaymentId},
    order_objects::CancelOutcome,
    OrderFlowApi,
    OrderManagement,
    PaymentGateway,
};

use crate::{
    auth::JwtClaims,
    data_objects::{StartPaymentRequest, StartPaymentResponse, ValidationRequest, ValidationResponse},
    errors::ServerError,
    webhook::WebhookEvent,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(start_payment => Post "/order/start" impl OrderManagement, PaymentGateway);
/// Opens a new order for the authenticated customer.
///
/// The response carries the payment id that the storefront hands to the PortOne checkout. The order stays `PENDING`
/// until the payment is validated or cancelled.
pub async fn start_payment<B: OrderManagement, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<StartPaymentRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST start_payment for customer {}", claims.customer_id);
    let StartPaymentRequest { total_price, order_items } = body.into_inner();
    let items = order_items.into_iter().map(NewOrderItem::from).collect();
    let order = api.start_payment(&claims.customer_id, total_price.into(), items).await?;
    Ok(HttpResponse::Ok().json(StartPaymentResponse { payment_id: order.payment_id, status: order.status }))
}

route!(validate_payment => Post "/order/validation" impl OrderManagement, PaymentGateway);
/// Reconciles an order against PortOne and returns the resulting status.
///
/// Any failure to confirm the payment is reported as a normal response with status `FAILED`. Only an unknown payment
/// id produces an error (404).
pub async fn validate_payment<B: OrderManagement, G: PaymentGateway>(
    body: web::Json<ValidationRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = body.into_inner().payment_id;
    debug!("💻️ POST validate_payment for {payment_id}");
    let result = api.validate_payment(&payment_id).await?;
    Ok(HttpResponse::Ok().json(ValidationResponse { order_id: result.order_id, status: result.status }))
}

route!(order_history => Get "/order/history" impl OrderManagement, PaymentGateway);
pub async fn order_history<B: OrderManagement, G: PaymentGateway>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET order_history for customer {}", claims.customer_id);
    let history = api.fetch_order_history(&claims.customer_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

// ----------------------------------------------   Webhooks  ----------------------------------------------------
route!(portone_webhook => Post "" impl OrderManagement, PaymentGateway);
/// Receives PortOne notifications. The signature has already been checked by the scope's middleware by the time this
/// handler runs.
///
/// Only cancellations change anything. Every other accepted event is acknowledged with an empty 200 so that PortOne
/// does not redeliver it. Store failures return a 500, which makes PortOne retry later.
pub async fn portone_webhook<B: OrderManagement, G: PaymentGateway>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let event = WebhookEvent::parse(body.as_ref()).map_err(|e| {
        warn!("🪝️ Rejecting webhook. {e}");
        ServerError::from(e)
    })?;
    if !event.is_cancellation() {
        info!("🪝️ Ignoring {} webhook", event.event_type);
        return Ok(HttpResponse::Ok().finish());
    }
    let payment_id = PaymentId::from(event.cancelled_payment_id()?);
    info!("🪝️ PortOne reports that payment {payment_id} has been cancelled");
    match api.cancel_payment(&payment_id).await? {
        CancelOutcome::Cancelled(order) => debug!("🪝️ Order #{} is now {}", order.id, order.status),
        CancelOutcome::AlreadyCancelled => debug!("🪝️ Payment {payment_id} was already cancelled"),
        CancelOutcome::NotCancellable(status) => debug!("🪝️ Payment {payment_id} is {status} and stays that way"),
        CancelOutcome::UnknownPayment => debug!("🪝️ No order is waiting on payment {payment_id}"),
    }
    Ok(HttpResponse::Ok().finish())
}
