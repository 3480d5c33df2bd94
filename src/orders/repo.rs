use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    lifecycle::{NewOrder, OrderStatus},
    repo_types::{Order, OrderRow},
};

#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn create(&self, new: &NewOrder) -> anyhow::Result<Order>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Order>>;
    async fn find_by_owner(&self, user_id: i64) -> anyhow::Result<Vec<Order>>;
    async fn list_all(&self) -> anyhow::Result<Vec<Order>>;
    /// Compare-and-set: writes `next` only if the stored status is still
    /// `expected`. Returns `None` when the row is gone or was changed
    /// concurrently.
    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> anyhow::Result<Option<Order>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgOrderRepo {
    db: PgPool,
}

impl PgOrderRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_orders(rows: Vec<OrderRow>) -> anyhow::Result<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl OrderRepo for PgOrderRepo {
    async fn create(&self, new: &NewOrder) -> anyhow::Result<Order> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (user_id, product_id, quantity, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, product_id, quantity, status, created_at, updated_at
            "#,
        )
        .bind(new.user_id())
        .bind(new.product_id())
        .bind(new.quantity())
        .bind(new.status().as_str())
        .fetch_one(&self.db)
        .await
        .context("insert order")?;
        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product_id, quantity, status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find order by id")?;
        row.map(Order::try_from).transpose()
    }

    async fn find_by_owner(&self, user_id: i64) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product_id, quantity, status, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list orders by owner")?;
        into_orders(rows)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, product_id, quantity, status, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list all orders")?;
        into_orders(rows)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
               SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
            RETURNING id, user_id, product_id, quantity, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.db)
        .await
        .context("update order status")?;
        row.map(Order::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete order")?;
        Ok(result.rows_affected() > 0)
    }
}
