use async_trait::async_trait;
use tracing::trace;

use crate::cache::ObjectCache;
use crate::storage::Link;

/// 空实现：每次都回源
pub struct NullObjectCache;

#[async_trait]
impl ObjectCache for NullObjectCache {
    async fn get(&self, key: &str) -> Option<Link> {
        trace!("NullObjectCache.get called for key: {}", key);
        None
    }

    async fn insert(&self, _key: &str, _value: Link) {}

    async fn remove(&self, _key: &str) {}

    async fn invalidate_all(&self) {}
}
