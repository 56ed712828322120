use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::analytics::{AccountingPool, ClickRecorder};
use crate::api::AppState;
use crate::cache::LinkCache;
use crate::config::StaticConfig;
use crate::services::{LinkResolver, RedirectService, UniquenessTracker};
use crate::session::{MokaSessionStore, SessionStore};
use crate::storage::{Storage, StorageFactory};

/// 服务启动所需的全部组件
pub struct StartupContext {
    pub storage: Storage,
    pub redirect: RedirectService,
    pub accounting: Arc<AccountingPool>,
}

impl StartupContext {
    pub fn app_state(&self, config: &StaticConfig) -> AppState {
        AppState {
            redirect: self.redirect.clone(),
            accounting: self.accounting.clone(),
            directory: self.storage.directory.clone(),
            session: config.session.clone(),
            trusted_proxies: config.server.trusted_proxies.clone(),
        }
    }
}

/// 用已经创建好的存储组装服务组件（测试也走这里）
pub fn assemble(config: &StaticConfig, storage: Storage) -> StartupContext {
    let cache = LinkCache::from_config(&config.cache);
    let resolver = LinkResolver::new(storage.directory.clone(), cache);
    let redirect = RedirectService::new(resolver, config.server.default_url.clone());

    let sessions: Arc<dyn SessionStore> = Arc::new(MokaSessionStore::from_config(&config.session));
    let tracker = UniquenessTracker::new(sessions);
    let recorder = ClickRecorder::new(storage.clicks.clone(), config.accounting.scan_page_size);
    let accounting = AccountingPool::start(&config.accounting, tracker, recorder);

    StartupContext {
        storage,
        redirect,
        accounting,
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(config)
        .await
        .context("Failed to create storage backend")?;

    let context = assemble(config, storage);

    info!(
        "Pre-startup completed in {} ms (directory: {}, clicks: {}, cache: {})",
        start_time.elapsed().as_millis(),
        context.storage.directory.backend_name(),
        context.storage.clicks.backend_name(),
        if config.cache.enabled { "moka" } else { "disabled" }
    );
    Ok(context)
}
