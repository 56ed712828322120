use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use crate::cache::ObjectCache;
use crate::storage::Link;

/// 基于 moka 的链接缓存，TTL 到期后重新读取目录
pub struct MokaObjectCache {
    inner: Cache<String, Link>,
}

impl MokaObjectCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        debug!(
            "MokaObjectCache initialized with max capacity: {}, TTL: {}s",
            max_capacity, ttl_secs
        );
        Self { inner }
    }

    #[cfg(test)]
    pub(crate) async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get(&self, key: &str) -> Option<Link> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: &str, value: Link) {
        self.inner.insert(key.to_string(), value).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
