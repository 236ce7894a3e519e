//! `SqliteDatabase` is the SQLite backend of the order payment engine.
//!
//! It implements [`OrderManagement`]. Status transitions run as a conditional `UPDATE` that is the first statement of
//! its transaction, so SQLite takes the write lock before anything is read, and two writers racing on the same order
//! are serialised.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, order_items, orders};
use crate::{
    db_types::{NewOrder, Order, OrderItem, PaymentId, StatusChange},
    order_lifecycle::{next_status, OrderEvent},
    traits::{OrderManagement, OrderStoreError, TransitionOutcome},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        order.validate().map_err(OrderStoreError::InvalidOrder)?;
        let mut tx = self.pool.begin().await?;
        let saved = orders::insert_order(&order, &mut tx).await?;
        let items = order_items::insert_order_items(saved.id, &order.items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved with id {} and {} items", saved.payment_id, saved.id, items.len());
        Ok(saved)
    }

    async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_id(payment_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_customer(customer_id, &mut conn).await?;
        Ok(orders)
    }

    async fn apply_order_event(
        &self,
        payment_id: &PaymentId,
        event: OrderEvent,
    ) -> Result<TransitionOutcome, OrderStoreError> {
        let expected = event.expected_status();
        let target = next_status(expected, event)?;
        let mut tx = self.pool.begin().await?;
        let updated = orders::compare_and_set_status(payment_id, expected, target, &mut tx).await?;
        let outcome = match updated {
            Some(order) => {
                if event == OrderEvent::PaymentConfirmed {
                    let removed = order_items::delete_order_items(order.id, &mut tx).await?;
                    trace!("🗃️ Cleared {removed} items from paid order {payment_id}");
                }
                TransitionOutcome::Applied(order)
            },
            None => {
                let current = orders::fetch_order_by_payment_id(payment_id, &mut tx)
                    .await?
                    .ok_or_else(|| OrderStoreError::OrderNotFound(payment_id.clone()))?;
                match next_status(current.status, event) {
                    Err(rejected) => debug!("🗃️ Order {payment_id} left unchanged. {rejected}"),
                    Ok(_) => warn!("🗃️ Order {payment_id} changed status while {event} was being applied"),
                }
                TransitionOutcome::Unchanged(current)
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_stale_pending_orders(&self, age: Duration, limit: i64) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_stale_pending_orders(age, limit, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<StatusChange>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let history = orders::fetch_status_history(order_id, &mut conn).await?;
        Ok(history)
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `OPS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
