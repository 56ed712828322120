//! SeaORM 连接与重试
//!
//! 链接目录和点击存储共享同一个 DatabaseConnection，支持 SQLite、MySQL/MariaDB 和 PostgreSQL。

mod connection;
pub mod retry;

pub use connection::{connect, connect_generic, connect_sqlite, run_migrations};

use crate::errors::{KurzError, Result};

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    let backend = backend.trim().to_ascii_lowercase();
    match backend.as_str() {
        "mariadb" => "mysql".to_string(),
        "postgresql" => "postgres".to_string(),
        _ => backend,
    }
}

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(KurzError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite:, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}
