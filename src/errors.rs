use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KurzError {
    LinkNotFound(String),
    StorageUnavailable(String),
    SessionWriteFailed(String),
    AccountingFailed(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    Serialization(String),
    Validation(String),
    FileOperation(String),
}

impl KurzError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            KurzError::LinkNotFound(_) => "E001",
            KurzError::StorageUnavailable(_) => "E002",
            KurzError::SessionWriteFailed(_) => "E003",
            KurzError::AccountingFailed(_) => "E004",
            KurzError::DatabaseConfig(_) => "E005",
            KurzError::DatabaseConnection(_) => "E006",
            KurzError::Serialization(_) => "E007",
            KurzError::Validation(_) => "E008",
            KurzError::FileOperation(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            KurzError::LinkNotFound(_) => "Link Not Found",
            KurzError::StorageUnavailable(_) => "Storage Unavailable",
            KurzError::SessionWriteFailed(_) => "Session Write Failed",
            KurzError::AccountingFailed(_) => "Accounting Failed",
            KurzError::DatabaseConfig(_) => "Database Configuration Error",
            KurzError::DatabaseConnection(_) => "Database Connection Error",
            KurzError::Serialization(_) => "Serialization Error",
            KurzError::Validation(_) => "Validation Error",
            KurzError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            KurzError::LinkNotFound(msg)
            | KurzError::StorageUnavailable(msg)
            | KurzError::SessionWriteFailed(msg)
            | KurzError::AccountingFailed(msg)
            | KurzError::DatabaseConfig(msg)
            | KurzError::DatabaseConnection(msg)
            | KurzError::Serialization(msg)
            | KurzError::Validation(msg)
            | KurzError::FileOperation(msg) => msg,
        }
    }

    /// 是否为瞬时错误（重试可能成功）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            KurzError::StorageUnavailable(_) | KurzError::DatabaseConnection(_)
        )
    }

    /// 格式化为彩色输出（用于启动失败时的终端提示）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for KurzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for KurzError {}

// 便捷的构造函数
impl KurzError {
    pub fn link_not_found<T: Into<String>>(msg: T) -> Self {
        KurzError::LinkNotFound(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        KurzError::StorageUnavailable(msg.into())
    }

    pub fn session_write_failed<T: Into<String>>(msg: T) -> Self {
        KurzError::SessionWriteFailed(msg.into())
    }

    pub fn accounting_failed<T: Into<String>>(msg: T) -> Self {
        KurzError::AccountingFailed(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        KurzError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        KurzError::DatabaseConnection(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        KurzError::Serialization(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        KurzError::Validation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        KurzError::FileOperation(msg.into())
    }
}

// 存储层的数据库错误一律视为存储不可用，由调用方决定是否重试
impl From<sea_orm::DbErr> for KurzError {
    fn from(err: sea_orm::DbErr) -> Self {
        KurzError::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for KurzError {
    fn from(err: std::io::Error) -> Self {
        KurzError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for KurzError {
    fn from(err: serde_json::Error) -> Self {
        KurzError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KurzError>;
