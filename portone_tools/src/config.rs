use log::*;
use market_common::Secret;

pub const DEFAULT_PORTONE_API_URL: &str = "https://api.portone.io";

#[derive(Debug, Clone, Default)]
pub struct PortOneConfig {
    /// Base URL of the PortOne REST API, without a trailing slash.
    pub api_url: String,
    /// The V2 API secret issued in the PortOne console.
    pub api_secret: Secret<String>,
    /// The store identifier (`store-…`) that payments are scoped to.
    pub store_id: String,
}

impl PortOneConfig {
    pub fn new(api_url: &str, api_secret: Secret<String>, store_id: &str) -> Self {
        Self { api_url: api_url.trim_end_matches('/').to_string(), api_secret, store_id: store_id.to_string() }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("OPS_PORTONE_API_URL").unwrap_or_else(|_| {
            info!("🪛️ OPS_PORTONE_API_URL not set, using {DEFAULT_PORTONE_API_URL} as default");
            DEFAULT_PORTONE_API_URL.to_string()
        });
        let api_secret = Secret::new(std::env::var("OPS_PORTONE_API_SECRET").unwrap_or_else(|_| {
            error!("🪛️ OPS_PORTONE_API_SECRET is not set. Payment validation will fail until it is configured.");
            String::default()
        }));
        let store_id = std::env::var("OPS_PORTONE_STORE_ID").unwrap_or_else(|_| {
            error!("🪛️ OPS_PORTONE_STORE_ID is not set. Please set it to the PortOne store id for this shop.");
            String::default()
        });
        Self::new(&api_url, api_secret, &store_id)
    }
}
