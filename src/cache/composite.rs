use std::sync::Arc;

use tracing::debug;

use crate::cache::negative_cache::{MokaNegativeCache, NullNegativeCache};
use crate::cache::object_cache::{MokaObjectCache, NullObjectCache};
use crate::cache::{CacheResult, NegativeCache, ObjectCache};
use crate::config::CacheConfig;
use crate::storage::Link;

/// 链接解析用的组合缓存：正向对象缓存 + negative cache
///
/// 两层的 TTL 都很短，链接被停用后最多延迟一个 positive TTL 失效。
#[derive(Clone)]
pub struct LinkCache {
    objects: Arc<dyn ObjectCache>,
    negatives: Arc<dyn NegativeCache>,
}

impl LinkCache {
    pub fn new(objects: Arc<dyn ObjectCache>, negatives: Arc<dyn NegativeCache>) -> Self {
        Self { objects, negatives }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if !config.enabled {
            debug!("Link cache disabled");
            return Self::disabled();
        }

        Self::new(
            Arc::new(MokaObjectCache::new(
                config.max_capacity,
                config.positive_ttl_secs,
            )),
            Arc::new(MokaNegativeCache::new(
                config.max_capacity,
                config.negative_ttl_secs,
            )),
        )
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NullObjectCache), Arc::new(NullNegativeCache))
    }

    pub async fn get(&self, key: &str) -> CacheResult {
        if let Some(link) = self.objects.get(key).await {
            return CacheResult::Found(link);
        }
        if self.negatives.contains(key).await {
            return CacheResult::NotFound;
        }
        CacheResult::Miss
    }

    pub async fn insert(&self, key: &str, link: Link) {
        self.negatives.remove(key).await;
        self.objects.insert(key, link).await;
    }

    pub async fn mark_missing(&self, key: &str) {
        self.negatives.mark(key).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.objects.remove(key).await;
        self.negatives.remove(key).await;
    }

    pub async fn invalidate_all(&self) {
        self.objects.invalidate_all().await;
        self.negatives.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> Link {
        Link {
            id: "1".to_string(),
            domain: "short.ly".to_string(),
            keyword: "abc".to_string(),
            destination_url: "https://example.com".to_string(),
            title: None,
            active: true,
            owner_id: "owner".to_string(),
        }
    }

    fn enabled() -> LinkCache {
        LinkCache::from_config(&CacheConfig::default())
    }

    #[tokio::test]
    async fn test_miss_then_found() {
        let cache = enabled();
        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::Miss));

        cache.insert("short.ly/abc", link()).await;
        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::Found(_)));
    }

    #[tokio::test]
    async fn test_insert_clears_negative_entry() {
        let cache = enabled();
        cache.mark_missing("short.ly/abc").await;
        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::NotFound));

        cache.insert("short.ly/abc", link()).await;
        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::Found(_)));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = enabled();
        cache.insert("short.ly/abc", link()).await;
        cache.invalidate("short.ly/abc").await;
        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::Miss));
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = LinkCache::disabled();
        cache.insert("short.ly/abc", link()).await;
        cache.mark_missing("short.ly/x").await;

        assert!(matches!(cache.get("short.ly/abc").await, CacheResult::Miss));
        assert!(matches!(cache.get("short.ly/x").await, CacheResult::Miss));
    }
}
