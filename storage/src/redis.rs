use async_trait::async_trait;
use errors::CacheError;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, error};
use yc_core::Cache;

const BACKEND: &str = "Redis";

pub struct RedisCache {
    _client: Arc<redis::Client>,
    connection_manager: redis::aio::ConnectionManager
}

impl RedisCache {
    pub async fn new(connection_string: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(connection_string).map_err(connectivity)?;

        let connection_manager = client
            .get_connection_manager()
            .await
            .map_err(connectivity)?;

        debug!("Redis cache connected");

        Ok(Self {
            _client: Arc::new(client),
            connection_manager
        })
    }
}

fn connectivity(e: redis::RedisError) -> CacheError {
    CacheError::Connectivity {
        backend: BACKEND.to_string(),
        reason: e.to_string()
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection_manager.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            error!(key, error = %e, "Redis GET failed");
            connectivity(e)
        })?;
        debug!(key, hit = value.is_some(), "Cache read");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut conn = self.connection_manager.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds).await.map_err(|e| {
            error!(key, error = %e, "Redis SET failed");
            connectivity(e)
        })?;
        debug!(key, ttl_seconds, "Cache write");
        Ok(())
    }
}
