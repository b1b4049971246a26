use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    session::{MemorySessionStore, SessionStore},
    storage::{ImageStore, image_store},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub sessions: Arc<dyn SessionStore>,
    pub images: Arc<dyn ImageStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: DbPool) -> Self {
        Self {
            orm: orm_from_pool(&pool),
            pool,
            sessions: Arc::new(MemorySessionStore::new(config.session_ttl)),
            images: image_store(&config.image_backend),
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
        }
    }
}
