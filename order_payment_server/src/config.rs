use std::{env, time::Duration};

use log::*;
use market_common::{parse_boolean_flag, parse_env_or_default, Secret};
use portone_tools::PortOneConfig;
use rand::RngCore;

use crate::errors::ServerError;

const DEFAULT_OPS_HOST: &str = "127.0.0.1";
const DEFAULT_OPS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;
const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;
const DEFAULT_RECONCILER_INTERVAL_SECS: u64 = 60;
const DEFAULT_STALE_ORDER_AGE_MINS: i64 = 30;
const DEFAULT_RECONCILER_BATCH_SIZE: i64 = 50;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub portone: PortOneConfig,
    pub webhook: WebhookConfig,
    /// The longest we wait for PortOne to answer a payment lookup before failing the validation.
    pub gateway_timeout: Duration,
    pub reconciler: ReconcilerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OPS_HOST.to_string(),
            port: DEFAULT_OPS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            portone: PortOneConfig::default(),
            webhook: WebhookConfig::default(),
            gateway_timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OPS_HOST").ok().unwrap_or_else(|| DEFAULT_OPS_HOST.into());
        let port = env_or_default("OPS_PORT", DEFAULT_OPS_PORT);
        let database_url = env::var("OPS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OPS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let portone = PortOneConfig::new_from_env_or_default();
        let webhook = WebhookConfig::from_env_or_default();
        let gateway_timeout =
            Duration::from_secs(env_or_default("OPS_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT_SECS));
        let reconciler = ReconcilerConfig::from_env_or_default();
        Self { host, port, database_url, auth, portone, webhook, gateway_timeout, reconciler }
    }
}

/// Reads `name` from the environment, falling back to `default` (with a warning) if the value cannot be parsed.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    let (value, err) = parse_env_or_default(env::var(name).ok(), default);
    if let Some(e) = err {
        warn!("🪛️ Invalid configuration value for {name}. {e} Using the default, {default}, instead.");
    }
    value
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The shared HS256 secret that access tokens are signed with by the identity service.
    pub jwt_secret: Secret<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No access token issued \
             elsewhere will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let mut key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self { jwt_secret: Secret::new(key) }
    }
}

impl AuthConfig {
    pub fn new(secret: &[u8]) -> Self {
        Self { jwt_secret: Secret::new(secret.to_vec()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("OPS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [OPS_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("OPS_JWT_SECRET is empty".to_string()));
        }
        Ok(Self::new(secret.as_bytes()))
    }
}

//-------------------------------------------------  WebhookConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// The PortOne webhook signing secret, as shown in the console (`whsec_…`).
    pub secret: Secret<String>,
    /// Webhooks whose timestamp differs from our clock by more than this are rejected.
    pub tolerance: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self { secret: Secret::default(), tolerance: Duration::from_secs(DEFAULT_WEBHOOK_TOLERANCE_SECS) }
    }
}

impl WebhookConfig {
    pub fn from_env_or_default() -> Self {
        let secret = Secret::new(env::var("OPS_PORTONE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("🪛️ OPS_PORTONE_WEBHOOK_SECRET is not set. The server cannot accept PortOne webhooks without it.");
            String::default()
        }));
        let tolerance =
            Duration::from_secs(env_or_default("OPS_WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS));
        Self { secret, tolerance }
    }
}

//-------------------------------------------------  ReconcilerConfig  -------------------------------------------------
/// Settings for the background job that resolves orders whose checkout was abandoned.
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Pending orders untouched for at least this long are re-validated.
    pub stale_age: chrono::Duration,
    pub batch_size: i64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(DEFAULT_RECONCILER_INTERVAL_SECS),
            stale_age: chrono::Duration::minutes(DEFAULT_STALE_ORDER_AGE_MINS),
            batch_size: DEFAULT_RECONCILER_BATCH_SIZE,
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env_or_default() -> Self {
        let enabled = parse_boolean_flag(env::var("OPS_RECONCILER_ENABLED").ok(), true);
        if !enabled {
            info!("🪛️ The stale order reconciler is disabled. Abandoned checkouts will stay PENDING.");
        }
        let interval_secs = env_or_default("OPS_RECONCILER_INTERVAL_SECS", DEFAULT_RECONCILER_INTERVAL_SECS);
        let interval = Duration::from_secs(interval_secs.max(1));
        let stale_mins = env_or_default("OPS_STALE_ORDER_AGE_MINS", DEFAULT_STALE_ORDER_AGE_MINS);
        let stale_age = chrono::Duration::minutes(stale_mins);
        let batch_size = env_or_default("OPS_RECONCILER_BATCH_SIZE", DEFAULT_RECONCILER_BATCH_SIZE).max(1);
        Self { enabled, interval, stale_age, batch_size }
    }
}
