pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::Utc;
use log::{ info, warn };
use serde::{ Deserialize, Serialize };
use sha2::{ Digest, Sha256 };
use std::sync::Arc;

use crate::cli::Args;
use crate::error::BoxError;
use crate::models::nearby::Coordinates;

const RESPONSE_KEY_PREFIX: &str = "response-cache:";
const GEO_KEY_PREFIX: &str = "geo-cache:";

/// Raw string store behind both caches. A `None` ttl keeps the value forever.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError>;

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), BoxError>;
}

pub fn create_cache_backend(args: &Args) -> Result<Arc<dyn CacheBackend>, BoxError> {
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let backend = redis::RedisCacheBackend::new(&args.redis_url, &args.redis_prefix)?;
            Ok(Arc::new(backend))
        }
        "memory" => Ok(Arc::new(memory::MemoryCacheBackend::default())),
        other => Err(format!("Unsupported cache backend: {}", other).into()),
    }
}

/// Lowercase, collapse runs of whitespace, trim.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// First 32 hex chars of sha256("{language}:{normalized text}").
pub fn cache_key(text: &str, language: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", language, normalize(text)).as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(32);
    key
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCacheEntry {
    pub cache_key: String,
    pub response: String,
    pub language: String,
    /// Serialized as `ttlEpochSeconds`.
    pub ttl_epoch_seconds: i64,
}

impl ResponseCacheEntry {
    pub fn is_expired(&self, now_epoch: i64) -> bool {
        self.ttl_epoch_seconds < now_epoch
    }
}

#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    ttl_secs: u64,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl_secs: u64) -> Self {
        Self { backend, ttl_secs }
    }

    /// Returns the cached reply, or `None` on a miss, an expired entry or a
    /// store failure. Expiry is checked here because backends may keep
    /// entries past their deadline.
    pub async fn get(&self, key: &str) -> Option<String> {
        let raw = match self.backend.get(&format!("{}{}", RESPONSE_KEY_PREFIX, key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return None;
            }
            Err(e) => {
                warn!("response_cache_read_failed key={} error={}", key, e);
                return None;
            }
        };
        let entry: ResponseCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("response_cache_entry_unreadable key={} error={}", key, e);
                return None;
            }
        };
        if entry.is_expired(Utc::now().timestamp()) {
            info!("response_cache_expired key={}", key);
            return None;
        }
        Some(entry.response)
    }

    pub async fn put(&self, key: &str, response: &str, language: &str) {
        let entry = ResponseCacheEntry {
            cache_key: key.to_string(),
            response: response.to_string(),
            language: language.to_string(),
            ttl_epoch_seconds: Utc::now().timestamp() + (self.ttl_secs as i64),
        };
        let result = match serde_json::to_string(&entry) {
            Ok(json) =>
                self.backend.set(
                    &format!("{}{}", RESPONSE_KEY_PREFIX, key),
                    &json,
                    Some(self.ttl_secs)
                ).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("response_cache_write_failed key={} error={}", key, e);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCacheEntry {
    pub location_key: String,
    pub lat: String,
    pub lon: String,
}

pub fn location_key(place: &str) -> String {
    place.trim().to_lowercase()
}

/// Place name to coordinates, kept forever.
#[derive(Clone)]
pub struct GeoCache {
    backend: Arc<dyn CacheBackend>,
}

impl GeoCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self, place: &str) -> Option<Coordinates> {
        let key = location_key(place);
        let raw = match self.backend.get(&format!("{}{}", GEO_KEY_PREFIX, key)).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("geo_cache_read_failed location={} error={}", key, e);
                return None;
            }
        };
        let entry: GeoCacheEntry = serde_json::from_str(&raw).ok()?;
        let lat = entry.lat.parse::<f64>().ok()?;
        let lon = entry.lon.parse::<f64>().ok()?;
        Coordinates::new(lat, lon)
    }

    pub async fn put(&self, place: &str, at: Coordinates) {
        let key = location_key(place);
        let entry = GeoCacheEntry {
            location_key: key.clone(),
            lat: at.lat.to_string(),
            lon: at.lon.to_string(),
        };
        let result = match serde_json::to_string(&entry) {
            Ok(json) => self.backend.set(&format!("{}{}", GEO_KEY_PREFIX, key), &json, None).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("geo_cache_write_failed location={} error={}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::MemoryCacheBackend;

    #[test]
    fn keys_ignore_case_and_whitespace() {
        assert_eq!(cache_key("  Fever   Treatment\n", "hi"), cache_key("fever treatment", "hi"));
        assert_eq!(cache_key("Fever treatment", "hi"), cache_key(&normalize("Fever treatment"), "hi"));
        assert_ne!(cache_key("fever treatment", "hi"), cache_key("fever treatment", "en"));
        assert_eq!(cache_key("x", "en").len(), 32);
    }

    #[tokio::test]
    async fn fresh_entries_are_returned() {
        let cache = ResponseCache::new(Arc::new(MemoryCacheBackend::default()), 86400);
        let key = cache_key("fever treatment", "en");
        cache.put(&key, "Drink fluids and rest.", "en").await;
        assert_eq!(cache.get(&key).await.as_deref(), Some("Drink fluids and rest."));
    }

    #[tokio::test]
    async fn expired_entries_are_misses_even_when_present() {
        let backend = Arc::new(MemoryCacheBackend::default());
        let key = cache_key("fever treatment", "en");
        let stale = ResponseCacheEntry {
            cache_key: key.clone(),
            response: "old answer".into(),
            language: "en".into(),
            ttl_epoch_seconds: Utc::now().timestamp() - 10,
        };
        backend
            .set(&format!("{}{}", RESPONSE_KEY_PREFIX, key), &serde_json::to_string(&stale).unwrap(), None)
            .await
            .unwrap();

        let cache = ResponseCache::new(backend, 86400);
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn entries_store_their_expiry_in_epoch_seconds() {
        let backend = Arc::new(MemoryCacheBackend::default());
        let cache = ResponseCache::new(backend.clone(), 60);
        let key = cache_key("cough", "hi");
        cache.put(&key, "गर्म पानी पिएं", "hi").await;

        let raw = backend.get(&format!("{}{}", RESPONSE_KEY_PREFIX, key)).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let expiry = stored["ttlEpochSeconds"].as_i64().unwrap();
        assert!((expiry - Utc::now().timestamp() - 60).abs() <= 2);
        assert_eq!(stored["cacheKey"], serde_json::json!(key));
        assert!(stored.get("ttl").is_none());
    }

    #[tokio::test]
    async fn geo_entries_are_keyed_by_trimmed_lowercase_name() {
        let backend = Arc::new(MemoryCacheBackend::default());
        let cache = GeoCache::new(backend.clone());
        cache.put("  Bengaluru ", Coordinates::new(12.9716, 77.5946).unwrap()).await;

        let hit = cache.get("BENGALURU").await.unwrap();
        assert!((hit.lat - 12.9716).abs() < 1e-9);

        let raw = backend.get("geo-cache:bengaluru").await.unwrap().unwrap();
        let entry: GeoCacheEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.lat, "12.9716");
        assert_eq!(entry.lon, "77.5946");
    }
}
