mod body;
pub mod services;

pub use body::AccountingBody;

use std::sync::Arc;

use actix_web::web;

use crate::analytics::AccountingPool;
use crate::config::SessionConfig;
use crate::services::RedirectService;
use crate::storage::LinkDirectory;

/// 请求处理共享的状态
pub struct AppState {
    pub redirect: RedirectService,
    pub accounting: Arc<AccountingPool>,
    pub directory: Arc<dyn LinkDirectory>,
    pub session: SessionConfig,
    pub trusted_proxies: Vec<String>,
}

/// 注册全部路由；健康检查必须在通配重定向之前
pub fn configure(cfg: &mut web::ServiceConfig) {
    services::health_routes(cfg);
    cfg.service(services::redirect_routes());
}
