//! PortOne webhook handling: signature verification, the request middleware that enforces it, and the payload types.
mod event;
mod middleware;
mod verifier;

pub use event::{WebhookEvent, WebhookEventData, TRANSACTION_CANCELLED};
pub use middleware::{WebhookSignatureMiddlewareFactory, WebhookSignatureMiddlewareService};
pub use verifier::{
    WebhookError,
    WebhookHeaders,
    WebhookVerifier,
    WEBHOOK_ID_HEADER,
    WEBHOOK_SIGNATURE_HEADER,
    WEBHOOK_TIMESTAMP_HEADER,
};
