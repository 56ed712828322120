//! 点击记录与链接缓存性能基准测试

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kurz::analytics::ClickRecorder;
use kurz::cache::{CacheResult, LinkCache};
use kurz::cache::negative_cache::MokaNegativeCache;
use kurz::cache::object_cache::MokaObjectCache;
use kurz::storage::{ClickEvent, Link, MemoryClickStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

fn create_test_link(keyword: &str) -> Link {
    Link {
        id: format!("id-{}", keyword),
        domain: "short.ly".to_string(),
        keyword: keyword.to_string(),
        destination_url: "https://example.com/very/long/path/to/destination".to_string(),
        title: None,
        active: true,
        owner_id: "owner".to_string(),
    }
}

fn new_recorder() -> ClickRecorder {
    ClickRecorder::new(Arc::new(MemoryClickStore::new()), 256)
}

// ============== 点击写入 ==============

fn bench_record_click(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let recorder = Arc::new(new_recorder());
    let counter = AtomicI64::new(1_700_000_000_000);

    c.bench_function("clicks/record", |b| {
        b.to_async(&rt).iter(|| {
            let r = Arc::clone(&recorder);
            let ts = counter.fetch_add(1, Ordering::Relaxed);
            async move {
                let mut event = ClickEvent::at("short.ly/abc123", ts);
                event.user_agent_family = Some("Firefox".to_string());
                r.record(&event).await.unwrap();
            }
        });
    });
}

// ============== 前缀扫描 ==============

fn bench_scan_clicks(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("clicks/scan");

    for size in [100i64, 1_000, 10_000] {
        let recorder = Arc::new(new_recorder());
        rt.block_on(async {
            for i in 0..size {
                let event = ClickEvent::at("short.ly/abc123", 1_700_000_000_000 + i);
                recorder.record(&event).await.unwrap();
                // 相邻关键字，扫描时必须跳过
                let other = ClickEvent::at("short.ly/abc1234", 1_700_000_000_000 + i);
                recorder.record(&other).await.unwrap();
            }
        });

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.to_async(&rt).iter(|| {
                let r = Arc::clone(&recorder);
                async move {
                    let timestamps = r
                        .list_clicks("short.ly/abc123")
                        .collect_timestamps()
                        .await
                        .unwrap();
                    assert_eq!(timestamps.len() as i64, size);
                }
            });
        });
    }

    group.finish();
}

// ============== 链接缓存 ==============

fn bench_link_cache(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = LinkCache::new(
        Arc::new(MokaObjectCache::new(10_000, 300)),
        Arc::new(MokaNegativeCache::new(10_000, 60)),
    );

    rt.block_on(async {
        for i in 0..1000 {
            let keyword = format!("key{}", i);
            let link = create_test_link(&keyword);
            cache.insert(&link.link_key(), link).await;
        }
        cache.mark_missing("short.ly/gone").await;
    });

    c.bench_function("cache/get_hit", |b| {
        b.to_async(&rt).iter(|| {
            let cache = cache.clone();
            async move {
                let result = cache.get("short.ly/key500").await;
                assert!(matches!(result, CacheResult::Found(_)));
            }
        });
    });

    c.bench_function("cache/get_negative", |b| {
        b.to_async(&rt).iter(|| {
            let cache = cache.clone();
            async move {
                let result = cache.get("short.ly/gone").await;
                assert!(matches!(result, CacheResult::NotFound));
            }
        });
    });
}

criterion_group!(benches, bench_record_click, bench_scan_clicks, bench_link_cache);
criterion_main!(benches);
