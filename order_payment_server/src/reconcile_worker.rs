use log::*;
use order_payment_engine::{order_objects::ValidationResult, OrderFlowApi, SqliteDatabase};
use tokio::task::{JoinError, JoinHandle};

use crate::{config::ReconcilerConfig, integrations::portone::PortOneGateway};

/// Starts the stale order reconciler. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Checkouts that the customer abandons never get a validation request, so every `interval` the worker re-validates a
/// batch of orders that have been `PENDING` for longer than `stale_age`.
pub fn start_reconcile_worker(
    api: OrderFlowApi<SqliteDatabase, PortOneGateway>,
    config: ReconcilerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.interval);
        info!("🕰️ Stale order reconciler started. Checking every {:?}", config.interval);
        loop {
            timer.tick().await;
            trace!("🕰️ Running stale order reconciliation");
            match api.reconcile_stale_orders(config.stale_age, config.batch_size).await {
                Ok(results) if results.is_empty() => {},
                Ok(results) => {
                    info!("🕰️ {} stale orders reconciled", results.len());
                    debug!("🕰️ Reconciled orders: {}", order_list(&results));
                },
                Err(e) => {
                    error!("🕰️ Error running stale order reconciliation: {e}");
                },
            }
        }
    })
}

/// Waits for the reconciler task to end, and logs how it ended. The reconciler never stops on its own, so any exit
/// means stale orders are no longer being checked.
pub async fn watch_reconcile_worker(handle: JoinHandle<()>) -> Result<(), JoinError> {
    let result = handle.await;
    match &result {
        Ok(()) => warn!("🕰️ Stale order reconciler stopped. Stale orders will no longer be reconciled."),
        Err(e) if e.is_panic() => {
            error!("🕰️ Stale order reconciler panicked ({e}). Stale orders will no longer be reconciled.")
        },
        Err(e) => warn!("🕰️ Stale order reconciler was cancelled. {e}"),
    }
    result
}

fn order_list(results: &[ValidationResult]) -> String {
    results
        .iter()
        .map(|r| format!("[{}] {}: {}", r.order_id, r.payment_id, r.status))
        .collect::<Vec<String>>()
        .join(", ")
}
