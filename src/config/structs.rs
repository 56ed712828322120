use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::errors::{KurzError, Result};
use crate::storage::backend::normalize_backend_name;

/// Cookie SameSite 策略
///
/// 反序列化不区分大小写，`KURZ__SESSION__SAME_SITE=strict` 也能生效
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(try_from = "String")]
#[strum(ascii_case_insensitive)]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

impl TryFrom<String> for SameSitePolicy {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.trim().parse().map_err(|_| {
            let valid: Vec<&'static str> = Self::iter().map(Into::into).collect();
            format!(
                "Invalid SameSite policy: '{}'. Valid: {}",
                value,
                valid.join(", ")
            )
        })
    }
}

impl From<SameSitePolicy> for actix_web::cookie::SameSite {
    fn from(policy: SameSitePolicy) -> Self {
        match policy {
            SameSitePolicy::Strict => actix_web::cookie::SameSite::Strict,
            SameSitePolicy::Lax => actix_web::cookie::SameSite::Lax,
            SameSitePolicy::None => actix_web::cookie::SameSite::None,
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、worker 数、可信代理
/// - database: 链接目录后端
/// - cache: 解析缓存
/// - session: 会话 cookie 与去重窗口
/// - accounting: 点击记账队列与点击存储
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：KURZ，分隔符：__
    /// 示例：KURZ__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or("config.toml");

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("KURZ")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.trusted_proxies")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| KurzError::validation(format!("Failed to build config: {}", e)))?;

        let config: StaticConfig = settings
            .try_deserialize()
            .map_err(|e| KurzError::validation(format!("Failed to deserialize config: {}", e)))?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        config.validate()?;
        Ok(config)
    }

    /// 启动前校验，拒绝无法运行的组合
    pub fn validate(&self) -> Result<()> {
        if self.accounting.workers == 0 {
            return Err(KurzError::validation("accounting.workers must be > 0"));
        }
        if self.accounting.queue_capacity == 0 {
            return Err(KurzError::validation(
                "accounting.queue_capacity must be > 0",
            ));
        }
        if self.accounting.scan_page_size == 0 {
            return Err(KurzError::validation(
                "accounting.scan_page_size must be > 0",
            ));
        }
        if !matches!(self.accounting.click_store.as_str(), "memory" | "database") {
            return Err(KurzError::validation(format!(
                "Unknown accounting.click_store: {}. Supported: memory, database",
                self.accounting.click_store
            )));
        }
        let backend = normalize_backend_name(&self.database.backend);
        if !matches!(backend.as_str(), "memory" | "sqlite" | "mysql" | "postgres") {
            return Err(KurzError::validation(format!(
                "Unknown database.backend: {}. Supported: memory, sqlite, mysql, mariadb, postgres",
                self.database.backend
            )));
        }
        if self.accounting.click_store == "database" && backend == "memory" {
            return Err(KurzError::validation(
                "accounting.click_store = \"database\" requires a SQL database.backend",
            ));
        }
        if self.session.cookie_name.is_empty() {
            return Err(KurzError::validation("session.cookie_name must not be empty"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub workers: usize,
    /// 可信反向代理（单 IP 或 CIDR）
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    /// 访问根路径时跳转的地址，未配置则返回 404
    #[serde(default)]
    pub default_url: Option<String>,
}

/// 链接目录数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// memory | sqlite | mysql | mariadb | postgres
    #[serde(default = "default_database_backend")]
    pub backend: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 单次查询超时（毫秒）
    #[serde(default = "default_database_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 解析缓存配置
///
/// 链接可能随时被外部管理端停用，positive_ttl 即最大陈旧窗口。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_positive_ttl")]
    pub positive_ttl_secs: u64,
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 会话空闲过期时间，即去重窗口
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_session_capacity")]
    pub max_sessions: u64,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
}

/// 点击记账配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingConfig {
    #[serde(default = "default_accounting_workers")]
    pub workers: usize,
    /// 队列满时丢弃最旧的任务
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_accounting_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// memory | database
    #[serde(default = "default_click_store")]
    pub click_store: String,
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_backend() -> String {
    "sqlite".to_string()
}

fn default_database_url() -> String {
    "sqlite://kurz.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout_ms() -> u64 {
    1500
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    50
}

fn default_retry_max_delay_ms() -> u64 {
    1000
}

fn default_cache_capacity() -> u64 {
    10000
}

fn default_positive_ttl() -> u64 {
    30
}

fn default_negative_ttl() -> u64 {
    10
}

fn default_cookie_name() -> String {
    "kurz_sid".to_string()
}

fn default_session_ttl() -> u64 {
    86400
}

fn default_session_capacity() -> u64 {
    100_000
}

fn default_accounting_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_store_timeout_ms() -> u64 {
    2000
}

fn default_accounting_retries() -> u32 {
    2
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_click_store() -> String {
    "database".to_string()
}

fn default_scan_page_size() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_cpu_count(),
            trusted_proxies: Vec::new(),
            default_url: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout_ms: default_database_timeout_ms(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: default_cache_capacity(),
            positive_ttl_secs: default_positive_ttl(),
            negative_ttl_secs: default_negative_ttl(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            max_sessions: default_session_capacity(),
            secure: false,
            same_site: SameSitePolicy::default(),
        }
    }
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            workers: default_accounting_workers(),
            queue_capacity: default_queue_capacity(),
            store_timeout_ms: default_store_timeout_ms(),
            max_retries: default_accounting_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            click_store: default_click_store(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
