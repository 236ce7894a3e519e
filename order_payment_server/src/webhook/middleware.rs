//! Signature middleware for the PortOne webhook scope.
//!
//! Every request into the scope is authenticated before any handler runs. The body is buffered, checked against the
//! signing headers, and then put back so that the handler can read it as usual. Requests that fail verification are
//! answered with a 401 and never reach the handler.
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;

use super::{WebhookHeaders, WebhookVerifier};
use crate::errors::ServerError;

pub struct WebhookSignatureMiddlewareFactory {
    verifier: Arc<WebhookVerifier>,
}

impl WebhookSignatureMiddlewareFactory {
    pub fn new(verifier: Arc<WebhookVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookSignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureMiddlewareService {
            verifier: Arc::clone(&self.verifier),
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookSignatureMiddlewareService<S> {
    verifier: Arc<WebhookVerifier>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);
        Box::pin(async move {
            trace!("🪝️ Checking webhook signature for {}", req.path());
            let headers = WebhookHeaders::from_headers(req.headers()).map_err(|e| {
                warn!("🪝️ Webhook rejected. {e}");
                ServerError::from(e)
            })?;
            let body = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🪝️ Failed to read webhook body: {e}");
                ServerError::InvalidRequestBody(e.to_string())
            })?;
            verifier.verify(&headers, body.as_ref()).map_err(ServerError::from)?;
            req.set_payload(bytes_to_payload(body));
            service.call(req).await
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
