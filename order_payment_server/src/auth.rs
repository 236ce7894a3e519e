//! Access token verification.
//!
//! Customers are authenticated by an identity service elsewhere in the marketplace, which issues HS256-signed JWTs.
//! The customer id travels in the standard `sub` claim, and tokens must carry an expiry. This server only ever
//! verifies tokens; it never issues them.
//!
//! Handlers that need an authenticated customer simply take a [`JwtClaims`] argument. The extractor reads the
//! `Authorization: Bearer <token>` header and rejects the request with a 401 if the token is missing, malformed,
//! badly signed or expired.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    prelude::*,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(rename = "sub")]
    pub customer_id: String,
}

pub struct TokenVerifier {
    key: Hs256Key,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: Hs256Key::new(config.jwt_secret.reveal()) }
    }

    /// Checks the token's signature and expiry, and returns its claims.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token: Token<JwtClaims> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let claims = token.into_parts().1.custom;
        if claims.customer_id.trim().is_empty() {
            return Err(AuthError::ValidationError("The token has no subject".to_string()));
        }
        trace!("💻️ Access token validated for customer {}", claims.customer_id);
        Ok(claims)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| ServerError::ConfigurationError("No access token verifier has been configured".to_string()))?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string()))?;
    verifier.verify(token).map_err(|e| {
        debug!("💻️ Rejected access token. {e}");
        ServerError::AuthenticationError(e)
    })
}
