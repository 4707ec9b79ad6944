use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{ AsyncCommands, Client };

use super::CacheBackend;
use crate::error::BoxError;
use crate::retry::{ is_transient_redis, with_backoff };

pub struct RedisCacheBackend {
    client: Client,
    key_prefix: String,
}

impl RedisCacheBackend {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, BoxError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let full_key = self.key(key);
        let key = &full_key;
        let value = with_backoff("cache_get", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            conn.get::<_, Option<String>>(key).await
        }).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), BoxError> {
        let full_key = self.key(key);
        let key = &full_key;
        with_backoff("cache_set", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            match ttl_secs {
                Some(ttl) if ttl > 0 => conn.set_ex::<_, _, ()>(key, value, ttl).await,
                _ => conn.set::<_, _, ()>(key, value).await,
            }
        }).await?;
        Ok(())
    }
}
