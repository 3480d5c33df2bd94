use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{NewProduct, Product, ProductChanges};

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn create(&self, new: NewProduct) -> anyhow::Result<Product>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Product>>;
    async fn list(&self) -> anyhow::Result<Vec<Product>>;
    async fn update(&self, id: i64, changes: ProductChanges) -> anyhow::Result<Option<Product>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgProductRepo {
    db: PgPool,
}

impl PgProductRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepo for PgProductRepo {
    async fn create(&self, new: NewProduct) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, stock, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.stock)
        .fetch_one(&self.db)
        .await
        .context("insert product")?;
        Ok(product)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find product by id")?;
        Ok(product)
    }

    async fn list(&self) -> anyhow::Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, stock, created_at, updated_at
            FROM products
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list products")?;
        Ok(products)
    }

    async fn update(&self, id: i64, changes: ProductChanges) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = COALESCE($2, name),
                   description = COALESCE($3, description),
                   price = COALESCE($4, price),
                   stock = COALESCE($5, stock),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, name, description, price, stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.stock)
        .fetch_optional(&self.db)
        .await
        .context("update product")?;
        Ok(product)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete product")?;
        Ok(result.rows_affected() > 0)
    }
}
