use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserRepo, UserRepo},
    },
    config::AppConfig,
    orders::repo::{OrderRepo, PgOrderRepo},
    products::repo::{PgProductRepo, ProductRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub orders: Arc<dyn OrderRepo>,
    pub products: Arc<dyn ProductRepo>,
    pub keys: Arc<JwtKeys>,
}

impl AppState {
    pub fn postgres(db: PgPool, config: &AppConfig) -> Self {
        Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            orders: Arc::new(PgOrderRepo::new(db.clone())),
            products: Arc::new(PgProductRepo::new(db)),
            keys: Arc::new(JwtKeys::from_config(&config.jwt)),
        }
    }

    /// State over a fresh in-memory store with a fixed signing key.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{config::JwtConfig, memory::MemoryStore};

        let store = Arc::new(MemoryStore::default());
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test".into(),
            ttl_minutes: 5,
        });
        Self {
            users: store.clone(),
            orders: store.clone(),
            products: store,
            keys: Arc::new(keys),
        }
    }
}
