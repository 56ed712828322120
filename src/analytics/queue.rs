//! 点击记账 worker 池
//!
//! - 有界队列，满时丢弃最旧的任务
//! - 固定数量的 tokio worker 从队列取任务：会话判定 → 写点击存储
//! - 每次存储操作带超时，瞬时错误有限次重试，最终失败只记日志
//! - 关闭时在宽限期内尽量排空队列

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, trace, warn};

use crate::analytics::{AccountingJob, ClickRecorder};
use crate::config::AccountingConfig;
use crate::errors::KurzError;
use crate::services::UniquenessTracker;
use crate::storage::backend::retry::{self, RetryConfig};

/// 记账统计
#[derive(Default)]
struct AccountingStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    recorded: AtomicU64,
    duplicates: AtomicU64,
    failed: AtomicU64,
}

/// 统计快照，用于 `/health/ready`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccountingSnapshot {
    pub submitted: u64,
    pub dropped: u64,
    pub recorded: u64,
    /// 非首次访问（含回环）而未记录的数量
    pub duplicates: u64,
    pub failed: u64,
    pub queued: usize,
    pub in_flight: usize,
}

struct PoolInner {
    queue: Mutex<VecDeque<AccountingJob>>,
    capacity: usize,
    notify: Notify,
    in_flight: AtomicUsize,
    stopped: AtomicBool,
    stats: AccountingStats,
    tracker: UniquenessTracker,
    recorder: ClickRecorder,
    retry_config: RetryConfig,
    store_timeout_ms: u64,
}

pub struct AccountingPool {
    inner: Arc<PoolInner>,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown_grace: Duration,
}

impl AccountingPool {
    /// 启动 worker 池，必须在 tokio runtime 中调用
    pub fn start(
        config: &AccountingConfig,
        tracker: UniquenessTracker,
        recorder: ClickRecorder,
    ) -> Arc<Self> {
        let inner = Arc::new(PoolInner {
            queue: Mutex::new(VecDeque::with_capacity(config.queue_capacity.min(4096))),
            capacity: config.queue_capacity.max(1),
            notify: Notify::new(),
            in_flight: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            stats: AccountingStats::default(),
            tracker,
            recorder,
            retry_config: RetryConfig::from(config),
            store_timeout_ms: config.store_timeout_ms,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker_count = config.workers.max(1);
        let workers = (0..worker_count)
            .map(|id| tokio::spawn(worker_loop(id, inner.clone(), shutdown_rx.clone())))
            .collect();

        info!(
            "Accounting pool started: {} workers, queue capacity {}, click store: {}",
            worker_count,
            inner.capacity,
            inner.recorder.store().backend_name()
        );

        Arc::new(Self {
            inner,
            shutdown_tx,
            workers: Mutex::new(workers),
            shutdown_grace: Duration::from_millis(config.shutdown_grace_ms),
        })
    }

    /// 提交任务，不阻塞；队列满时丢弃最旧的任务
    pub fn submit(&self, job: AccountingJob) {
        let inner = &self.inner;
        if inner.stopped.load(Ordering::Acquire) {
            inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Accounting pool stopped, dropping click for {}",
                job.link_key()
            );
            return;
        }

        let evicted = {
            let mut queue = inner.queue.lock();
            let evicted = if queue.len() >= inner.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(job);
            evicted
        };

        inner.stats.submitted.fetch_add(1, Ordering::Relaxed);
        if let Some(old) = evicted {
            inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Accounting queue full, dropped oldest click for {} at {}",
                old.link_key(),
                old.timestamp
            );
        }
        inner.notify.notify_one();
    }

    pub fn stats(&self) -> AccountingSnapshot {
        let inner = &self.inner;
        AccountingSnapshot {
            submitted: inner.stats.submitted.load(Ordering::Relaxed),
            dropped: inner.stats.dropped.load(Ordering::Relaxed),
            recorded: inner.stats.recorded.load(Ordering::Relaxed),
            duplicates: inner.stats.duplicates.load(Ordering::Relaxed),
            failed: inner.stats.failed.load(Ordering::Relaxed),
            queued: inner.queue.lock().len(),
            in_flight: inner.in_flight.load(Ordering::Acquire),
        }
    }

    pub fn recorder(&self) -> &ClickRecorder {
        &self.inner.recorder
    }

    fn is_idle(&self) -> bool {
        // 先读队列：worker 出队前已在锁内递增 in_flight
        let queued = self.inner.queue.lock().len();
        queued == 0 && self.inner.in_flight.load(Ordering::Acquire) == 0
    }

    /// 等待队列和进行中的任务全部完成，超时返回 false
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// 在宽限期内排空队列，然后停止所有 worker
    pub async fn shutdown(&self) {
        if self.inner.stopped.load(Ordering::Acquire) {
            return;
        }

        let drained = self.wait_idle(self.shutdown_grace).await;
        self.inner.stopped.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(true);

        let abandoned = {
            let mut queue = self.inner.queue.lock();
            let n = queue.len();
            queue.clear();
            n
        };
        if abandoned > 0 {
            self.inner
                .stats
                .dropped
                .fetch_add(abandoned as u64, Ordering::Relaxed);
        }

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            if drained {
                let _ = handle.await;
            } else {
                handle.abort();
            }
        }

        let stats = self.stats();
        if drained {
            info!(
                "Accounting pool stopped: recorded={}, duplicates={}, dropped={}, failed={}",
                stats.recorded, stats.duplicates, stats.dropped, stats.failed
            );
        } else {
            warn!(
                "Accounting pool grace period elapsed, {} queued clicks abandoned",
                abandoned
            );
        }
    }
}

async fn worker_loop(id: usize, inner: Arc<PoolInner>, mut shutdown_rx: watch::Receiver<bool>) {
    trace!("Accounting worker {} started", id);
    loop {
        let job = {
            let mut queue = inner.queue.lock();
            let job = queue.pop_front();
            if job.is_some() {
                inner.in_flight.fetch_add(1, Ordering::AcqRel);
            }
            job
        };

        match job {
            Some(job) => {
                process_job(&inner, job).await;
                inner.in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            None => {
                if *shutdown_rx.borrow_and_update() {
                    break;
                }
                tokio::select! {
                    _ = inner.notify.notified() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("Accounting worker {} exited", id);
}

async fn process_job(inner: &PoolInner, job: AccountingJob) {
    let first_visit = inner
        .tracker
        .is_first_visit(
            &job.session_id,
            &job.domain,
            &job.keyword,
            job.is_loopback(),
        )
        .await;

    if !first_visit {
        inner.stats.duplicates.fetch_add(1, Ordering::Relaxed);
        trace!("Not a unique visit, skipping: {}", job.link_key());
        return;
    }

    let event = job.to_event();
    let result = retry::with_retry_timeout(
        "record_click",
        inner.retry_config,
        inner.store_timeout_ms,
        || inner.recorder.record(&event),
    )
    .await;

    match result {
        Ok(()) => {
            inner.stats.recorded.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            inner.stats.failed.fetch_add(1, Ordering::Relaxed);
            let err = KurzError::accounting_failed(e.message().to_string());
            error!(
                code = err.code(),
                link_key = %event.link_key,
                timestamp = event.timestamp,
                "Click not recorded: {}",
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::session::MokaSessionStore;
    use crate::storage::{ClickStore, MemoryClickStore};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    fn config(workers: usize, queue_capacity: usize) -> AccountingConfig {
        AccountingConfig {
            workers,
            queue_capacity,
            store_timeout_ms: 200,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 5,
            shutdown_grace_ms: 1000,
            ..AccountingConfig::default()
        }
    }

    fn tracker() -> UniquenessTracker {
        UniquenessTracker::new(Arc::new(MokaSessionStore::new(1000, 60)))
    }

    fn job(session: &str, keyword: &str, timestamp: i64) -> AccountingJob {
        let mut job = AccountingJob::new(session, "short.ly", keyword);
        job.timestamp = timestamp;
        job.client_ip = Some("203.0.113.5".parse().unwrap());
        job
    }

    /// 前 N 次写入失败的存储
    struct FlakyStore {
        inner: MemoryClickStore,
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl ClickStore for FlakyStore {
        async fn append(&self, key: &str, value: &str) -> Result<()> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(KurzError::storage_unavailable("disk busy"));
            }
            self.inner.append(key, value).await
        }

        async fn scan_prefix(
            &self,
            prefix: &str,
            after: Option<&str>,
            limit: usize,
        ) -> Result<Vec<(String, String)>> {
            self.inner.scan_prefix(prefix, after, limit).await
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_unique_visits_are_recorded_once() {
        let store = Arc::new(MemoryClickStore::new());
        let pool = AccountingPool::start(
            &config(2, 100),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        pool.submit(job("s1", "abc", 1_000));
        assert!(pool.wait_idle(Duration::from_secs(2)).await);
        pool.submit(job("s1", "abc", 2_000));
        assert!(pool.wait_idle(Duration::from_secs(2)).await);

        let stats = pool.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.recorded, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_loopback_is_never_recorded() {
        let store = Arc::new(MemoryClickStore::new());
        let pool = AccountingPool::start(
            &config(1, 100),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        let mut local = job("s1", "abc", 1_000);
        local.client_ip = Some("127.0.0.1".parse().unwrap());
        pool.submit(local);

        assert!(pool.wait_idle(Duration::from_secs(2)).await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_many_distinct_clicks_all_land() {
        let store = Arc::new(MemoryClickStore::new());
        let pool = AccountingPool::start(
            &config(4, 1000),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        for i in 0..200 {
            pool.submit(job(&format!("s{}", i), "abc", 1_000 + i));
        }
        assert!(pool.wait_idle(Duration::from_secs(5)).await);

        let timestamps = pool
            .recorder()
            .list_clicks("short.ly/abc")
            .collect_timestamps()
            .await
            .unwrap();
        assert_eq!(timestamps.len(), 200);
        assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = Arc::new(FlakyStore {
            inner: MemoryClickStore::new(),
            failures_left: AtomicU32::new(2),
        });
        let pool = AccountingPool::start(
            &config(1, 10),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        pool.submit(job("s1", "abc", 1_000));
        assert!(pool.wait_idle(Duration::from_secs(2)).await);

        assert_eq!(pool.stats().recorded, 1);
        assert_eq!(store.inner.len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_count_as_failed() {
        let store = Arc::new(FlakyStore {
            inner: MemoryClickStore::new(),
            failures_left: AtomicU32::new(100),
        });
        let pool = AccountingPool::start(
            &config(1, 10),
            tracker(),
            ClickRecorder::new(store, 16),
        );

        pool.submit(job("s1", "abc", 1_000));
        assert!(pool.wait_idle(Duration::from_secs(2)).await);

        let stats = pool.stats();
        assert_eq!(stats.recorded, 0);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_full_queue_drops_oldest() {
        let store = Arc::new(MemoryClickStore::new());
        let pool = AccountingPool::start(
            &config(1, 2),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        // current_thread: worker 在我们让出前不会运行
        pool.submit(job("s1", "a", 1));
        pool.submit(job("s2", "b", 2));
        pool.submit(job("s3", "c", 3));
        assert_eq!(pool.stats().dropped, 1);

        assert!(pool.wait_idle(Duration::from_secs(2)).await);
        let first = pool
            .recorder()
            .list_clicks("short.ly/a")
            .collect_timestamps()
            .await
            .unwrap();
        assert!(first.is_empty());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_rejects() {
        let store = Arc::new(MemoryClickStore::new());
        let pool = AccountingPool::start(
            &config(2, 100),
            tracker(),
            ClickRecorder::new(store.clone(), 16),
        );

        for i in 0..10 {
            pool.submit(job(&format!("s{}", i), "abc", 100 + i));
        }
        pool.shutdown().await;
        assert_eq!(store.len(), 10);

        pool.submit(job("late", "abc", 999));
        let stats = pool.stats();
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.queued, 0);
    }
}
