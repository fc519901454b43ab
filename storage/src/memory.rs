use async_trait::async_trait;
use errors::CacheError;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use yc_core::Cache;

/// Process-local cache honouring per-entry TTLs.
///
/// Expired entries read as absent and are dropped lazily on the next write.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>
}

struct Entry {
    value: String,
    expires_at: Instant
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live entry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.expires_at - now)
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + Duration::from_secs(ttl_seconds)
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("context:a", "[]", 60).await.unwrap();
        assert_eq!(cache.get("context:a").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(cache.get("context:b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "v1", 10).await.unwrap();
        cache.set("k", "v2", 3600).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v2"));
        assert!(cache.ttl("k").await.unwrap() > Duration::from_secs(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", 5).await.unwrap();
        assert_eq!(cache.len().await, 1);

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.ttl("k").await.is_none());
        assert!(cache.is_empty().await);
    }
}
