use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info};

use crate::analytics::AccountingPool;

/// 宽限期之外额外等待 worker 退出的时间
const WORKER_EXIT_MARGIN: Duration = Duration::from_secs(2);

/// HTTP 服务停止后排空记账队列
pub async fn perform_shutdown_tasks(pool: &AccountingPool, grace: Duration) {
    match timeout(grace + WORKER_EXIT_MARGIN, pool.shutdown()).await {
        Ok(()) => {
            let stats = pool.stats();
            info!(
                "Shutdown complete: {} clicks recorded, {} dropped",
                stats.recorded, stats.dropped
            );
        }
        Err(_) => {
            error!(
                "Accounting shutdown timed out after {} ms",
                (grace + WORKER_EXIT_MARGIN).as_millis()
            );
        }
    }
}
