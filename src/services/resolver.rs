use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheResult, LinkCache};
use crate::errors::{KurzError, Result};
use crate::storage::{Link, LinkDirectory, link_key};

/// 链接解析：缓存 → 链接目录
#[derive(Clone)]
pub struct LinkResolver {
    directory: Arc<dyn LinkDirectory>,
    cache: LinkCache,
}

impl LinkResolver {
    pub fn new(directory: Arc<dyn LinkDirectory>, cache: LinkCache) -> Self {
        Self { directory, cache }
    }

    pub fn directory(&self) -> &Arc<dyn LinkDirectory> {
        &self.directory
    }

    /// 解析 `(domain, keyword)` 的活跃链接
    ///
    /// 只返回 `LinkNotFound` 或 `StorageUnavailable` 两类错误。
    pub async fn resolve(&self, domain: &str, keyword: &str) -> Result<Link> {
        let key = link_key(domain, keyword);

        match self.cache.get(&key).await {
            CacheResult::Found(link) => return Ok(link),
            CacheResult::NotFound => {
                debug!("Negative cache hit: {}", key);
                return Err(KurzError::link_not_found(key));
            }
            CacheResult::Miss => {}
        }

        match self.directory.find_active_link(domain, keyword).await {
            Ok(Some(link)) if link.active => {
                self.cache.insert(&key, link.clone()).await;
                Ok(link)
            }
            Ok(_) => {
                debug!("Link not found: {}", key);
                self.cache.mark_missing(&key).await;
                Err(KurzError::link_not_found(key))
            }
            Err(e) => {
                warn!("Link directory unavailable while resolving {}: {}", key, e);
                match e {
                    KurzError::StorageUnavailable(_) => Err(e),
                    other => Err(KurzError::storage_unavailable(other.message().to_string())),
                }
            }
        }
    }

    pub async fn invalidate(&self, domain: &str, keyword: &str) {
        self.cache.invalidate(&link_key(domain, keyword)).await;
    }

    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all().await;
    }
}
