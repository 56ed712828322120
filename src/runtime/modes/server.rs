//! Server mode

use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::api;
use crate::config::StaticConfig;
use crate::runtime::lifetime;
use crate::system::signal::wait_for_shutdown;

/// 运行 HTTP 服务，直到收到关闭信号
///
/// 日志系统必须在调用前初始化
pub async fn run_server(config: StaticConfig) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;

    let state = web::Data::new(startup.app_state(&config));
    let accounting = startup.accounting.clone();

    if config.server.trusted_proxies.is_empty() {
        info!("No trusted proxies configured, forwarded headers are ignored");
    } else {
        warn!(
            "Trusting forwarded headers from: {:?}",
            config.server.trusted_proxies
        );
    }

    let workers = config.server.workers.clamp(1, 32);
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure)
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(workers)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    info!("Starting server at http://{} ({} workers)", bind_address, workers);

    let handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        res = &mut server_task => {
            res.context("Server task panicked")?
                .context("Server exited with error")?;
        }
        _ = wait_for_shutdown() => {
            // 先停 HTTP，保证不再有新的记账任务进入
            handle.stop(true).await;
            if let Err(e) = server_task.await {
                warn!("Server task ended abnormally: {}", e);
            }
        }
    }

    lifetime::shutdown::perform_shutdown_tasks(
        &accounting,
        Duration::from_millis(config.accounting.shutdown_grace_ms),
    )
    .await;

    Ok(())
}
