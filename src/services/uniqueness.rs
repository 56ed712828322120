use std::sync::Arc;

use tracing::warn;

use crate::errors::KurzError;
use crate::session::SessionStore;

/// 判断一次访问是否为本会话内对该链接的首次访问
#[derive(Clone)]
pub struct UniquenessTracker {
    sessions: Arc<dyn SessionStore>,
}

impl UniquenessTracker {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// - 回环地址：始终为 false，且不写会话
    /// - 会话中已有该关键字：false
    /// - 否则写入会话并返回 true
    ///
    /// 会话读写失败只记日志，不影响返回值。同一会话的并发请求可能都返回 true。
    pub async fn is_first_visit(
        &self,
        session_id: &str,
        domain: &str,
        keyword: &str,
        requester_is_loopback: bool,
    ) -> bool {
        if requester_is_loopback {
            return false;
        }

        let mut keywords = match self.sessions.get_keyword_set(session_id, domain).await {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!(
                    "Session read failed for {}, treating as empty: {}",
                    session_id, e
                );
                Default::default()
            }
        };

        if keywords.contains(keyword) {
            return false;
        }

        keywords.insert(keyword.to_string());
        if let Err(e) = self
            .sessions
            .save_keyword_set(session_id, domain, keywords)
            .await
        {
            let err = KurzError::session_write_failed(e.message().to_string());
            warn!(code = err.code(), "Session {} not persisted: {}", session_id, err);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::session::MokaSessionStore;
    use async_trait::async_trait;
    use std::collections::HashSet;

    fn tracker() -> UniquenessTracker {
        UniquenessTracker::new(Arc::new(MokaSessionStore::new(100, 60)))
    }

    struct FailingSessions;

    #[async_trait]
    impl SessionStore for FailingSessions {
        async fn get_keyword_set(&self, _: &str, _: &str) -> Result<HashSet<String>> {
            Err(KurzError::storage_unavailable("session backend down"))
        }

        async fn save_keyword_set(&self, _: &str, _: &str, _: HashSet<String>) -> Result<()> {
            Err(KurzError::storage_unavailable("session backend down"))
        }
    }

    #[tokio::test]
    async fn test_first_then_repeat() {
        let tracker = tracker();
        assert!(tracker.is_first_visit("s1", "short.ly", "abc", false).await);
        assert!(!tracker.is_first_visit("s1", "short.ly", "abc", false).await);
    }

    #[tokio::test]
    async fn test_sessions_domains_and_keywords_are_independent() {
        let tracker = tracker();
        assert!(tracker.is_first_visit("s1", "short.ly", "abc", false).await);
        assert!(tracker.is_first_visit("s2", "short.ly", "abc", false).await);
        assert!(tracker.is_first_visit("s1", "go.to", "abc", false).await);
        assert!(tracker.is_first_visit("s1", "short.ly", "xyz", false).await);
    }

    #[tokio::test]
    async fn test_loopback_never_counts() {
        let tracker = tracker();
        assert!(!tracker.is_first_visit("s1", "short.ly", "abc", true).await);
        // 回环访问不会占用会话，之后的正常访问仍算首次
        assert!(tracker.is_first_visit("s1", "short.ly", "abc", false).await);
    }

    #[tokio::test]
    async fn test_session_failures_are_swallowed() {
        let tracker = UniquenessTracker::new(Arc::new(FailingSessions));
        assert!(tracker.is_first_visit("s1", "short.ly", "abc", false).await);
        assert!(tracker.is_first_visit("s1", "short.ly", "abc", false).await);
    }
}
