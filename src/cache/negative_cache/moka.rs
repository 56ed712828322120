use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::trace;

use crate::cache::NegativeCache;

/// 不存在的 link key，TTL 较短，链接被创建后最多延迟一个 TTL 生效
pub struct MokaNegativeCache {
    inner: Cache<String, ()>,
}

impl MokaNegativeCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        trace!(
            "MokaNegativeCache initialized: max_capacity={}, ttl={}s",
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
impl NegativeCache for MokaNegativeCache {
    async fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    async fn mark(&self, key: &str) {
        trace!("Marking link as missing: {}", key);
        self.inner.insert(key.to_string(), ()).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn clear(&self) {
        self.inner.invalidate_all();
    }
}
