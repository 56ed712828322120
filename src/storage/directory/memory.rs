use async_trait::async_trait;
use dashmap::DashMap;

use super::LinkDirectory;
use crate::errors::Result;
use crate::storage::{Link, link_key};

/// 进程内链接目录
///
/// 同一 `(domain, keyword)` 可以保存多条历史记录，只有 `active` 的那条参与解析。
/// domain 按 ASCII 小写保存和比较，keyword 区分大小写。
#[derive(Default)]
pub struct MemoryLinkDirectory {
    links: DashMap<String, Vec<Link>>,
}

impl MemoryLinkDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(links: impl IntoIterator<Item = Link>) -> Self {
        let directory = Self::new();
        for link in links {
            directory.insert(link);
        }
        directory
    }

    /// 插入链接；若新链接为活跃状态，同键的旧活跃链接会被停用
    pub fn insert(&self, mut link: Link) {
        link.domain.make_ascii_lowercase();
        let mut rows = self.links.entry(link.link_key()).or_default();
        if link.active {
            for row in rows.iter_mut() {
                row.active = false;
            }
        }
        rows.retain(|row| row.id != link.id);
        rows.push(link);
    }

    /// 停用链接，返回是否存在被停用的活跃链接
    pub fn deactivate(&self, domain: &str, keyword: &str) -> bool {
        let Some(mut rows) = self.links.get_mut(&link_key(&domain.to_ascii_lowercase(), keyword)) else {
            return false;
        };
        let mut changed = false;
        for row in rows.iter_mut().filter(|row| row.active) {
            row.active = false;
            changed = true;
        }
        changed
    }
}

#[async_trait]
impl LinkDirectory for MemoryLinkDirectory {
    async fn find_active_link(&self, domain: &str, keyword: &str) -> Result<Option<Link>> {
        Ok(self
            .links
            .get(&link_key(&domain.to_ascii_lowercase(), keyword))
            .and_then(|rows| rows.iter().find(|row| row.active).cloned()))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, keyword: &str, url: &str, active: bool) -> Link {
        Link {
            id: id.to_string(),
            domain: "short.ly".to_string(),
            keyword: keyword.to_string(),
            destination_url: url.to_string(),
            title: None,
            active,
            owner_id: "owner-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_only_active_link_is_returned() {
        let directory = MemoryLinkDirectory::with_links([
            link("1", "abc", "https://old.example.com", false),
            link("2", "abc", "https://example.com", true),
        ]);

        let found = directory.find_active_link("short.ly", "abc").await.unwrap();
        assert_eq!(found.unwrap().destination_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_inserting_active_link_retires_previous() {
        let directory = MemoryLinkDirectory::new();
        directory.insert(link("1", "abc", "https://one.example.com", true));
        directory.insert(link("2", "abc", "https://two.example.com", true));

        let found = directory.find_active_link("short.ly", "abc").await.unwrap();
        assert_eq!(found.unwrap().id, "2");
    }

    #[tokio::test]
    async fn test_deactivate() {
        let directory = MemoryLinkDirectory::with_links([link("1", "abc", "https://e.com", true)]);

        assert!(directory.deactivate("short.ly", "abc"));
        assert!(!directory.deactivate("short.ly", "abc"));
        assert!(directory.find_active_link("short.ly", "abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_domain_is_case_insensitive() {
        let mut mixed = link("1", "Abc", "https://example.com", true);
        mixed.domain = "Short.LY".to_string();
        let directory = MemoryLinkDirectory::with_links([mixed]);

        let found = directory.find_active_link("short.ly", "Abc").await.unwrap().unwrap();
        assert_eq!(found.domain, "short.ly");
        assert!(directory.find_active_link("SHORT.ly", "Abc").await.unwrap().is_some());
        assert!(directory.find_active_link("short.ly", "abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_link() {
        let directory = MemoryLinkDirectory::new();
        assert!(directory.find_active_link("short.ly", "nope").await.unwrap().is_none());
    }
}
