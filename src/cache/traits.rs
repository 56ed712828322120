use async_trait::async_trait;

use crate::storage::Link;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 近期确认过不存在（negative cache 命中）
    NotFound,
    /// 没有缓存，需要查目录
    Miss,
    /// 命中
    Found(Link),
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Link>;
    async fn insert(&self, key: &str, value: Link);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// 记录"确定不存在"的 key，防止不存在的关键字反复打到目录
#[async_trait]
pub trait NegativeCache: Send + Sync {
    async fn contains(&self, key: &str) -> bool;
    async fn mark(&self, key: &str);
    async fn remove(&self, key: &str);
    async fn clear(&self);
}
