//! 点击事件的有序 KV 存储
//!
//! key 格式：`link_<domain>/<keyword>_click_<unix_millis>`，毫秒数补零到 13 位，
//! 字典序即时间序。列出某链接的点击就是对 `link_<link_key>_click_` 做前缀扫描。
//! value 是 JSON 编码的 [`ClickMetadata`](crate::storage::ClickMetadata)。

mod database;
mod memory;

pub use database::SeaOrmClickStore;
pub use memory::MemoryClickStore;

use async_trait::async_trait;

use crate::errors::{KurzError, Result};

/// 时间戳在 key 中的固定宽度
pub const TIMESTAMP_WIDTH: usize = 13;

/// 可编码进 key 的最大毫秒时间戳（不含）
pub const MAX_TIMESTAMP_MILLIS: i64 = 10_000_000_000_000;

/// 有序 KV 存储接口
///
/// 写入方只追加，不做读改写；同一 key 重复写入直接覆盖。
#[async_trait]
pub trait ClickStore: Send + Sync {
    async fn append(&self, key: &str, value: &str) -> Result<()>;

    /// 按 key 升序返回以 `prefix` 开头、且严格大于 `after`（若提供）的至多 `limit` 条记录
    async fn scan_prefix(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<(String, String)>>;

    fn backend_name(&self) -> &'static str;
}

/// 某链接全部点击的扫描前缀
pub fn click_prefix(link_key: &str) -> String {
    format!("link_{}_click_", link_key)
}

/// 构造点击 key
pub fn click_key(link_key: &str, timestamp_millis: i64) -> Result<String> {
    if !(0..MAX_TIMESTAMP_MILLIS).contains(&timestamp_millis) {
        return Err(KurzError::validation(format!(
            "Click timestamp out of range: {}",
            timestamp_millis
        )));
    }
    Ok(format!(
        "{}{:0width$}",
        click_prefix(link_key),
        timestamp_millis,
        width = TIMESTAMP_WIDTH
    ))
}

/// 从 key 中解析时间戳
///
/// 后缀不是恰好 13 位数字的 key 属于另一个关键字（关键字本身包含 `_click_`），返回 `None`。
pub fn parse_click_timestamp(prefix: &str, key: &str) -> Option<i64> {
    let suffix = key.strip_prefix(prefix)?;
    if suffix.len() != TIMESTAMP_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// 把前缀转成 SQL LIKE 模式，转义通配符（`_` 在 key 中很常见）
pub(crate) fn like_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 8);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_key_layout() {
        let key = click_key("short.ly/abc123", 1_700_000_000_000).unwrap();
        assert_eq!(key, "link_short.ly/abc123_click_1700000000000");
    }

    #[test]
    fn test_click_key_is_zero_padded() {
        let key = click_key("a/b", 42).unwrap();
        assert_eq!(key, "link_a/b_click_0000000000042");
        assert!(click_key("a/b", 41).unwrap() < key);
    }

    #[test]
    fn test_click_key_rejects_out_of_range() {
        assert!(click_key("a/b", -1).is_err());
        assert!(click_key("a/b", MAX_TIMESTAMP_MILLIS).is_err());
    }

    #[test]
    fn test_parse_click_timestamp() {
        let prefix = click_prefix("a/b");
        assert_eq!(
            parse_click_timestamp(&prefix, "link_a/b_click_1700000000000"),
            Some(1_700_000_000_000)
        );
        // 关键字 `b_click_x` 的 key 也以同一前缀开头
        assert_eq!(
            parse_click_timestamp(&prefix, "link_a/b_click_x_click_1700000000000"),
            None
        );
        assert_eq!(parse_click_timestamp(&prefix, "link_a/c_click_1700000000000"), None);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("link_a/b_click_"), "link\\_a/b\\_click\\_%");
        assert_eq!(like_pattern("50%"), "50\\%%");
    }
}
