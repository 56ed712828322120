use async_trait::async_trait;

use crate::cache::NegativeCache;

/// 禁用 negative cache
pub struct NullNegativeCache;

#[async_trait]
impl NegativeCache for NullNegativeCache {
    async fn contains(&self, _key: &str) -> bool {
        false
    }

    async fn mark(&self, _key: &str) {}

    async fn remove(&self, _key: &str) {}

    async fn clear(&self) {}
}
