use chrono::Duration;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, PaymentId, StatusChange},
    traits::OrderStoreError,
};

/// Inserts a new order header using the given connection. This is not atomic on its own. Callers that also store
/// the order items must run this inside a transaction and pass `&mut tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (payment_id, customer_id, total_price, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.payment_id.as_str())
    .bind(order.customer_id.as_str())
    .bind(order.total_price.value())
    .bind(OrderStatusType::Pending.to_string())
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderStoreError::OrderAlreadyExists(order.payment_id.clone()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_order_by_payment_id(
    payment_id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_id = $1")
        .bind(payment_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_orders_for_customer(
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    trace!("🗃️ Fetched {} orders for customer {customer_id}", orders.len());
    Ok(orders)
}

/// Moves the order from `expected` to `new_status`, if and only if it is currently in `expected`.
///
/// The check and the write happen in a single statement, so concurrent callers cannot both succeed. Returns `None`
/// if the order does not exist or is not in the expected status.
pub(crate) async fn compare_and_set_status(
    payment_id: &PaymentId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE payment_id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status.to_string())
    .bind(payment_id.as_str())
    .bind(expected.to_string())
    .fetch_optional(conn)
    .await?;
    if let Some(o) = &order {
        debug!("🗃️ Order {} moved from {expected} to {}", o.payment_id, o.status);
    }
    Ok(order)
}

/// Fetches up to `limit` `PENDING` orders that have not been touched for at least `age`, oldest first.
pub(crate) async fn fetch_stale_pending_orders(
    age: Duration,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE status = 'PENDING' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) >= $1
            ORDER BY updated_at ASC, id ASC
            LIMIT $2;
        "#,
    )
    .bind(age.num_seconds())
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub(crate) async fn fetch_status_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusChange>, sqlx::Error> {
    let history = sqlx::query_as("SELECT * FROM order_status_log WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(history)
}
