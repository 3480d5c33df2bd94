//! In-memory repositories backing the unit and router tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{
    auth::{
        repo::{EmailTaken, UserRepo},
        repo_types::{NewUser, User, UserChanges},
    },
    orders::{
        lifecycle::{NewOrder, OrderStatus},
        repo::OrderRepo,
        repo_types::Order,
    },
    products::{
        repo::ProductRepo,
        repo_types::{NewProduct, Product, ProductChanges},
    },
};

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Table<User>>,
    orders: Mutex<Table<Order>>,
    products: Mutex<Table<Product>>,
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    orders
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut table = self.users.lock().await;
        if table.rows.values().any(|u| u.email == new.email) {
            return Err(EmailTaken.into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: table.allocate(),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let table = self.users.lock().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> anyhow::Result<Option<User>> {
        let mut table = self.users.lock().await;
        if let Some(email) = &changes.email {
            if table.rows.values().any(|u| u.id != id && &u.email == email) {
                return Err(EmailTaken.into());
            }
        }
        let Some(user) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.users.lock().await.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderRepo for MemoryStore {
    async fn create(&self, new: &NewOrder) -> anyhow::Result<Order> {
        let mut table = self.orders.lock().await;
        let now = OffsetDateTime::now_utc();
        let order = Order {
            id: table.allocate(),
            user_id: new.user_id(),
            product_id: new.product_id(),
            quantity: new.quantity(),
            status: new.status(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Order>> {
        Ok(self.orders.lock().await.rows.get(&id).cloned())
    }

    async fn find_by_owner(&self, user_id: i64) -> anyhow::Result<Vec<Order>> {
        let table = self.orders.lock().await;
        let owned = table
            .rows
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Order>> {
        let table = self.orders.lock().await;
        Ok(newest_first(table.rows.values().cloned().collect()))
    }

    async fn update_status(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        let mut table = self.orders.lock().await;
        match table.rows.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = next;
                order.updated_at = OffsetDateTime::now_utc();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.orders.lock().await.rows.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn create(&self, new: NewProduct) -> anyhow::Result<Product> {
        let mut table = self.products.lock().await;
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: table.allocate(),
            name: new.name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Product>> {
        Ok(self.products.lock().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Product>> {
        Ok(self.products.lock().await.rows.values().cloned().collect())
    }

    async fn update(&self, id: i64, changes: ProductChanges) -> anyhow::Result<Option<Product>> {
        let mut table = self.products.lock().await;
        let Some(product) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        product.updated_at = OffsetDateTime::now_utc();
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.products.lock().await.rows.remove(&id).is_some())
    }
}
