use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::StaticConfig;
use crate::errors::Result;

pub mod backend;
pub mod click;
pub mod directory;
pub mod models;

pub use click::{ClickStore, MemoryClickStore, SeaOrmClickStore};
pub use directory::{LinkDirectory, MemoryLinkDirectory, SeaOrmLinkDirectory};
pub use models::{ClickEvent, ClickMetadata, Link, link_key};

/// 已组装好的存储层
#[derive(Clone)]
pub struct Storage {
    pub directory: Arc<dyn LinkDirectory>,
    pub clicks: Arc<dyn ClickStore>,
    /// 数据库连接（memory 后端时为 None）
    pub db: Option<DatabaseConnection>,
}

pub struct StorageFactory;

impl StorageFactory {
    /// 按配置创建链接目录和点击存储，两者共享同一个数据库连接
    pub async fn create(config: &StaticConfig) -> Result<Storage> {
        let backend = backend::normalize_backend_name(&config.database.backend);

        if backend == "memory" {
            info!("Storage backend: memory (data is not persisted)");
            return Ok(Storage {
                directory: Arc::new(MemoryLinkDirectory::new()),
                clicks: Arc::new(MemoryClickStore::new()),
                db: None,
            });
        }

        let db = backend::connect(&config.database).await?;
        let directory: Arc<dyn LinkDirectory> =
            Arc::new(SeaOrmLinkDirectory::new(db.clone(), &config.database));
        let clicks: Arc<dyn ClickStore> = match config.accounting.click_store.as_str() {
            "memory" => Arc::new(MemoryClickStore::new()),
            _ => Arc::new(SeaOrmClickStore::new(db.clone())),
        };

        info!(
            "Storage backend: {} (clicks: {})",
            backend,
            clicks.backend_name()
        );

        Ok(Storage {
            directory,
            clicks,
            db: Some(db),
        })
    }
}
