//! Authentication of PortOne webhook deliveries.
//!
//! PortOne signs every webhook following the Standard Webhooks scheme. Three headers accompany the raw body:
//! * `webhook-id`: a unique id for the delivery,
//! * `webhook-timestamp`: the delivery time, in seconds since the Unix epoch,
//! * `webhook-signature`: `v1,<base64 HMAC-SHA256 of "{id}.{timestamp}.{body}">`.
//!
//! The HMAC key is the console secret with its `whsec_` prefix removed, base64-decoded. Decoding happens once, when
//! the verifier is constructed.
//!
//! Deliveries are checked for freshness before the signature is computed, so replayed messages are turned away without
//! any HMAC work.
use std::time::Duration;

use actix_web::http::header::HeaderMap;
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use market_common::Secret;
use sha2::Sha256;
use thiserror::Error;

pub const WEBHOOK_ID_HEADER: &str = "webhook-id";
pub const WEBHOOK_SIGNATURE_HEADER: &str = "webhook-signature";
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "webhook-timestamp";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1,";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("The {0} header is missing or not valid text.")]
    MissingHeader(&'static str),
    #[error("The webhook timestamp is not a valid Unix timestamp.")]
    InvalidTimestamp,
    #[error("The webhook timestamp is outside the permitted window.")]
    StaleTimestamp,
    #[error("The webhook signature is invalid.")]
    InvalidSignature,
    #[error("The webhook secret is not valid. {0}")]
    InvalidSecret(String),
    #[error("The webhook payload could not be read. {0}")]
    MalformedPayload(String),
}

impl WebhookError {
    /// True for every failure that means the delivery could not be proven to come from PortOne.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader(_) | Self::InvalidTimestamp | Self::StaleTimestamp | Self::InvalidSignature
        )
    }
}

/// The signing headers of a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub signature: String,
    pub timestamp: String,
}

impl WebhookHeaders {
    pub fn new<S: Into<String>>(id: S, signature: S, timestamp: S) -> Self {
        Self { id: id.into(), signature: signature.into(), timestamp: timestamp.into() }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, WebhookError> {
        let get = |name: &'static str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(WebhookError::MissingHeader(name))
        };
        Ok(Self {
            id: get(WEBHOOK_ID_HEADER)?,
            signature: get(WEBHOOK_SIGNATURE_HEADER)?,
            timestamp: get(WEBHOOK_TIMESTAMP_HEADER)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    key: Secret<Vec<u8>>,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: &Secret<String>, tolerance: Duration) -> Result<Self, WebhookError> {
        let encoded = secret.reveal().trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        if encoded.is_empty() {
            return Err(WebhookError::InvalidSecret("The webhook secret is empty".to_string()));
        }
        let key = base64::decode(encoded).map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        Ok(Self { key: Secret::new(key), tolerance })
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies a delivery against the current clock.
    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, body, Utc::now().timestamp())
    }

    /// Verifies a delivery as if the current time were `now` (in Unix seconds).
    pub fn verify_at(&self, headers: &WebhookHeaders, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let timestamp = headers.timestamp.parse::<i64>().map_err(|_| WebhookError::InvalidTimestamp)?;
        let drift = now.abs_diff(timestamp);
        if drift > self.tolerance.as_secs() {
            warn!("🪝️ Webhook {} is {drift}s away from our clock. Rejecting it.", headers.id);
            return Err(WebhookError::StaleTimestamp);
        }
        let reject = || {
            warn!("🪝️ Webhook {} carries an invalid signature. Rejecting it.", headers.id);
            WebhookError::InvalidSignature
        };
        let encoded = headers.signature.strip_prefix(SIGNATURE_VERSION).ok_or_else(reject)?;
        let signature = base64::decode(encoded).map_err(|_| reject())?;
        // The header must be the canonical encoding of the MAC, byte for byte.
        if base64::encode(&signature) != encoded {
            return Err(reject());
        }
        let mac = self.mac(&headers.id, &headers.timestamp, body)?;
        mac.verify_slice(&signature).map_err(|_| reject())?;
        trace!("🪝️ Webhook {} signature check ✅️", headers.id);
        Ok(())
    }

    /// Produces the `webhook-signature` header value for the given delivery.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<String, WebhookError> {
        let mac = self.mac(id, timestamp, body)?;
        Ok(format!("{SIGNATURE_VERSION}{}", base64::encode(mac.finalize().into_bytes())))
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(self.key.reveal()).map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }
}
