use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrderItem, OrderItem},
    traits::OrderStoreError,
};

/// Stores the items of order `order_id`, preserving their submission order in the `position` column.
pub async fn insert_order_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderStoreError> {
    let mut result = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, position, product_id, cart_id, product_name, product_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(position as i64)
        .bind(item.product_id)
        .bind(item.cart_id)
        .bind(item.product_name.as_str())
        .bind(item.product_price.value())
        .bind(item.quantity)
        .fetch_one(&mut *conn)
        .await?;
        result.push(row);
    }
    Ok(result)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY position ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Removes all items of the order. Returns the number of items removed.
pub(crate) async fn delete_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected())
}
