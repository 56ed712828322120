//! 链接目录：外部链接管理端维护的只读数据源

mod database;
mod memory;

pub use database::SeaOrmLinkDirectory;
pub use memory::MemoryLinkDirectory;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::Link;

#[async_trait]
pub trait LinkDirectory: Send + Sync {
    /// 查找 `(domain, keyword)` 当前活跃的链接
    ///
    /// - `Ok(None)`: 没有活跃链接
    /// - `Err(StorageUnavailable)`: 存储不可达
    async fn find_active_link(&self, domain: &str, keyword: &str) -> Result<Option<Link>>;

    async fn health_check(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
