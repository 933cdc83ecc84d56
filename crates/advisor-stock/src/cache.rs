//! Short-lived cache for quote fields and price history

use cached::{Cached, TimedCache};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for market data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Stock symbol
    pub symbol: String,
    /// Operation type ("quote", "history", ...)
    pub endpoint: String,
    /// Additional parameters
    pub params: String,
}

impl CacheKey {
    pub fn new(
        symbol: impl Into<String>,
        endpoint: impl Into<String>,
        params: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            endpoint: endpoint.into(),
            params: params.into(),
        }
    }
}

/// Thread-safe TTL cache storing values as JSON
pub struct StockCache {
    cache: Arc<RwLock<TimedCache<CacheKey, serde_json::Value>>>,
}

impl StockCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        // TimedCache evicts on read, so even lookups need the write lock
        let mut cache = self.cache.write().await;
        let value = cache.cache_get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Insert a value into the cache
    pub async fn insert<T: Serialize>(&self, key: CacheKey, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                let mut cache = self.cache.write().await;
                let _ = cache.cache_set(key, json);
            }
            Err(e) => tracing::debug!("Skipping cache insert for {:?}: {}", key, e),
        }
    }

    /// Return the cached value or run `fetcher` and cache its result
    ///
    /// Errors are never cached.
    pub async fn get_or_fetch<T, F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);
        let value = fetcher().await?;
        self.insert(key, &value).await;
        Ok(value)
    }
}

impl Clone for StockCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache = StockCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "quote", "");

        cache.insert(key.clone(), &vec![1.0_f64, 2.0]).await;

        let retrieved: Option<Vec<f64>> = cache.get(&key).await;
        assert_eq!(retrieved, Some(vec![1.0, 2.0]));
    }

    #[tokio::test]
    async fn test_cache_get_or_fetch() {
        let cache = StockCache::new(Duration::from_secs(60));
        let key = CacheKey::new("AAPL", "history", "1mo");

        let mut call_count = 0;
        let first: Result<f64, String> = cache
            .get_or_fetch(key.clone(), || {
                call_count += 1;
                async { Ok(150.0) }
            })
            .await;
        assert_eq!(first.unwrap(), 150.0);

        let second: Result<f64, String> = cache
            .get_or_fetch(key, || {
                call_count += 1;
                async { Ok(999.0) }
            })
            .await;
        assert_eq!(second.unwrap(), 150.0);
        assert_eq!(call_count, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = StockCache::new(Duration::from_secs(60));
        let key = CacheKey::new("BAD", "quote", "");

        let failed: Result<f64, String> = cache
            .get_or_fetch(key.clone(), || async { Err("boom".to_string()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.get::<f64>(&key).await.is_none());
    }
}
