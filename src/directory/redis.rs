use async_trait::async_trait;
use log::error;
use redis::{ AsyncCommands, Client };

use super::{ DirectoryStore, Listing, UserProfile };
use crate::error::BoxError;
use crate::retry::{ is_transient_redis, with_backoff };

/// Listings live under `shop:{id}` with a `shops:pincode:{pincode}` list as
/// the secondary index; profiles under `user:{id}`.
pub struct RedisDirectoryStore {
    client: Client,
    key_prefix: String,
}

impl RedisDirectoryStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, BoxError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl DirectoryStore for RedisDirectoryStore {
    async fn listings_by_pincode(&self, pincode: &str) -> Result<Vec<Listing>, BoxError> {
        let index = format!("{}shops:pincode:{}", self.key_prefix, pincode);
        let index = &index;
        let ids: Vec<String> = with_backoff("listings_by_pincode", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            conn.lrange(index, 0, -1).await
        }).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| format!("{}shop:{}", self.key_prefix, id))
            .collect();
        let keys = &keys;
        let docs: Vec<Option<String>> = with_backoff("listings_by_pincode", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await
        }).await?;

        let mut listings = Vec::with_capacity(docs.len());
        for json in docs.into_iter().flatten() {
            match serde_json::from_str::<Listing>(&json) {
                Ok(listing) => listings.push(listing),
                Err(e) => error!("Error parsing listing under pincode {}: {}", pincode, e),
            }
        }
        Ok(listings)
    }

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BoxError> {
        let key = format!("{}user:{}", self.key_prefix, user_id);
        let key = &key;
        let raw: Option<String> = with_backoff("user_profile", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            conn.get(key).await
        }).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
