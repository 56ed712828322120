//! 存储操作重试模块
//!
//! 指数退避 + 随机抖动，每次尝试可带独立超时。链接目录查询和点击记账共用。

use sea_orm::DbErr;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::KurzError;

/// 可判定是否值得重试的错误
pub trait Retryable: Display {
    fn is_retryable(&self) -> bool;

    /// 超时后构造的错误
    fn timed_out(operation_name: &str, timeout_ms: u64) -> Self;
}

impl Retryable for DbErr {
    fn is_retryable(&self) -> bool {
        is_retryable_error(self)
    }

    fn timed_out(operation_name: &str, timeout_ms: u64) -> Self {
        DbErr::Custom(format!(
            "Operation '{}' timed out after {}ms",
            operation_name, timeout_ms
        ))
    }
}

impl Retryable for KurzError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }

    fn timed_out(operation_name: &str, timeout_ms: u64) -> Self {
        KurzError::storage_unavailable(format!(
            "Operation '{}' timed out after {}ms",
            operation_name, timeout_ms
        ))
    }
}

/// 判断数据库错误是否可重试
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | // 连接池获取失败
        DbErr::Conn(_) => true, // 连接问题
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_runtime_error(runtime_err)
        }
        _ => false,
    }
}

/// 判断运行时错误是否可重试（死锁、锁超时等）
fn is_retryable_runtime_error(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error()
                && let Some(code) = db_err.code()
            {
                return matches!(
                    code.as_ref(),
                    // MySQL 死锁和锁超时
                    "1213" | "1205" |
                    // PostgreSQL 序列化失败和死锁
                    "40001" | "40P01" |
                    // SQLite BUSY 和 LOCKED
                    "5" | "6"
                );
            }
            is_retryable_error_message(&sqlx_err.to_string().to_lowercase())
        }
        RuntimeErr::Internal(msg) => is_retryable_error_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 通过错误消息判断是否可重试（回退方案）
fn is_retryable_error_message(err_str: &str) -> bool {
    err_str.contains("deadlock")
        || err_str.contains("lock wait timeout")
        || err_str.contains("database is locked")
        || err_str.contains("serialization failure")
}

/// 重试配置
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

impl From<&crate::config::DatabaseConfig> for RetryConfig {
    fn from(config: &crate::config::DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

impl From<&crate::config::AccountingConfig> for RetryConfig {
    fn from(config: &crate::config::AccountingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// 带超时的指数退避重试执行器
///
/// 每次尝试有独立的超时控制，超时按可重试处理
pub async fn with_retry_timeout<T, E, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    timeout_ms: u64,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(Duration::from_millis(timeout_ms), operation()).await;

        let err = match result {
            Ok(Ok(value)) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(value);
            }
            Ok(Err(e)) if e.is_retryable() => e,
            Ok(Err(e)) => {
                debug!(
                    "Operation '{}' failed with non-retryable error: {}",
                    operation_name, e
                );
                return Err(e);
            }
            Err(_elapsed) => E::timed_out(operation_name, timeout_ms),
        };

        if attempt >= config.max_retries {
            warn!(
                "Operation '{}' failed, retries exhausted: {}",
                operation_name, err
            );
            return Err(err);
        }

        attempt += 1;
        let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}

/// 计算指数退避延迟（带 0-25% 抖动）
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::random::<u64>() % (capped / 4 + 1);
    capped.saturating_add(jitter)
}
