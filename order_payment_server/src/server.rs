use std::{path::Path, sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_payment_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    integrations::{portone::PortOneGateway, settlement_log::create_settlement_log_handlers},
    reconcile_worker::{start_reconcile_worker, watch_reconcile_worker},
    routes::{health, OrderHistoryRoute, PortoneWebhookRoute, StartPaymentRoute, ValidatePaymentRoute},
    webhook::{WebhookSignatureMiddlewareFactory, WebhookVerifier},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    prepare_database(&config.database_url).await?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    let gateway =
        PortOneGateway::new(config.portone.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let verifier = WebhookVerifier::new(&config.webhook.secret, config.webhook.tolerance)
        .map_err(|e| ServerError::ConfigurationError(format!("Cannot verify PortOne webhooks. {e}")))?;
    info!("🪝️ Accepting PortOne webhooks up to {:?} away from our clock", verifier.tolerance());
    let handlers = create_settlement_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.reconciler.enabled {
        let api = OrderFlowApi::new(db.clone(), gateway.clone(), config.gateway_timeout, producers.clone());
        let worker = start_reconcile_worker(api, config.reconciler.clone());
        tokio::spawn(watch_reconcile_worker(worker));
    }
    let srv = create_server_instance(config, db, gateway, verifier, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PortOneGateway,
    verifier: WebhookVerifier,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let token_verifier = web::Data::new(TokenVerifier::new(&config.auth));
    let webhook_verifier = Arc::new(verifier);
    let gateway_timeout = config.gateway_timeout;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), gateway_timeout, producers.clone());
        let webhook_scope = web::scope("/webhook-portone")
            .wrap(WebhookSignatureMiddlewareFactory::new(Arc::clone(&webhook_verifier)))
            .service(PortoneWebhookRoute::<SqliteDatabase, PortOneGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ops::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(token_verifier.clone())
            .service(health)
            .service(StartPaymentRoute::<SqliteDatabase, PortOneGateway>::new())
            .service(ValidatePaymentRoute::<SqliteDatabase, PortOneGateway>::new())
            .service(OrderHistoryRoute::<SqliteDatabase, PortOneGateway>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Creates the SQLite database file, and its directory, if they do not exist yet.
async fn prepare_database(url: &str) -> Result<(), ServerError> {
    let exists = Sqlite::database_exists(url).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if exists {
        return Ok(());
    }
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    info!("🗃️ Creating new database at {url}");
    Sqlite::create_database(url).await.map_err(|e| ServerError::InitializeError(e.to_string()))
}
