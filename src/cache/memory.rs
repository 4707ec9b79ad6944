use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::CacheBackend;
use crate::error::BoxError;

/// Local development backend. Entries are never evicted; readers enforce expiry.
#[derive(Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: Option<u64>) -> Result<(), BoxError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
