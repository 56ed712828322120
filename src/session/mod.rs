//! 请求方会话：保存每个域名下本会话已访问过的关键字

mod moka;

pub use self::moka::MokaSessionStore;

use std::collections::HashSet;

use actix_web::cookie::Cookie;
use actix_web::cookie::time::Duration as CookieDuration;
use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::errors::Result;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取会话在 `domain` 下的关键字集合，会话不存在时返回空集合
    async fn get_keyword_set(&self, session_id: &str, domain: &str) -> Result<HashSet<String>>;

    async fn save_keyword_set(
        &self,
        session_id: &str,
        domain: &str,
        keywords: HashSet<String>,
    ) -> Result<()>;
}

/// 生成新的会话 ID
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 会话 ID 只接受我们自己签发的格式，其余一律重新签发
pub fn is_valid_session_id(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// 构建会话 cookie
pub fn session_cookie(config: &SessionConfig, session_id: &str) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), session_id.to_string())
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site.into())
        .max_age(CookieDuration::seconds(config.ttl_secs as i64))
        .finish()
}
