use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::store::{InMemoryStore, MySqlStore, RecordStore};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Builds the record store selected by `STORE_BACKEND`.
pub async fn init_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
            let pool = init_db(url).await?;
            info!("Connected to MySQL store");
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
