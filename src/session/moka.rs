use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use parking_lot::RwLock;
use tracing::debug;

use super::SessionStore;
use crate::config::SessionConfig;
use crate::errors::Result;

type DomainKeywords = Arc<RwLock<HashMap<String, HashSet<String>>>>;

/// 进程内会话存储
///
/// 会话在 `ttl_secs` 内没有任何读写即过期，过期后同一 cookie 视为新会话。
pub struct MokaSessionStore {
    inner: Cache<String, DomainKeywords>,
}

impl MokaSessionStore {
    pub fn new(max_sessions: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(Duration::from_secs(ttl_secs))
            .build();

        debug!(
            "MokaSessionStore initialized: max_sessions={}, ttl={}s",
            max_sessions, ttl_secs
        );
        Self { inner }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_sessions, config.ttl_secs)
    }

    #[cfg(test)]
    pub(crate) async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn get_keyword_set(&self, session_id: &str, domain: &str) -> Result<HashSet<String>> {
        Ok(self
            .inner
            .get(session_id)
            .await
            .and_then(|domains| domains.read().get(domain).cloned())
            .unwrap_or_default())
    }

    async fn save_keyword_set(
        &self,
        session_id: &str,
        domain: &str,
        keywords: HashSet<String>,
    ) -> Result<()> {
        let domains = self
            .inner
            .get_with(session_id.to_string(), async {
                Arc::new(RwLock::new(HashMap::new()))
            })
            .await;
        domains.write().insert(domain.to_string(), keywords);
        Ok(())
    }
}
