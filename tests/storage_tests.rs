//! SQLite-backed storage tests
//!
//! Link directory lookups and the ordered click table, each test on its own
//! temporary database file.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use kurz::analytics::ClickRecorder;
use kurz::config::{DatabaseConfig, StaticConfig};
use kurz::storage::backend::{connect_sqlite, run_migrations};
use kurz::storage::click::{click_key, click_prefix};
use kurz::storage::{
    ClickEvent, ClickStore, Link, LinkDirectory, SeaOrmClickStore, SeaOrmLinkDirectory,
    StorageFactory,
};

async fn setup() -> (TempDir, DatabaseConnection) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("kurz_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = connect_sqlite(&db_url)
        .await
        .expect("Failed to connect to SQLite");
    run_migrations(&db).await.expect("Failed to run migrations");
    (temp_dir, db)
}

fn link(id: &str, keyword: &str, url: &str, active: bool) -> Link {
    Link {
        id: id.to_string(),
        domain: "short.ly".to_string(),
        keyword: keyword.to_string(),
        destination_url: url.to_string(),
        title: None,
        active,
        owner_id: "acct-1".to_string(),
    }
}

// =============================================================================
// Link directory
// =============================================================================

#[tokio::test]
async fn test_directory_returns_only_active_link() {
    let (_dir, db) = setup().await;
    let directory = SeaOrmLinkDirectory::new(db, &DatabaseConfig::default());

    directory
        .upsert(&link("1", "abc123", "https://old.example.com", false))
        .await
        .unwrap();
    directory
        .upsert(&link("2", "abc123", "https://example.com", true))
        .await
        .unwrap();

    let found = directory
        .find_active_link("short.ly", "abc123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "2");
    assert_eq!(found.destination_url, "https://example.com");

    assert!(
        directory
            .find_active_link("short.ly", "missing")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        directory
            .find_active_link("other.host", "abc123")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_directory_sees_deactivation() {
    let (_dir, db) = setup().await;
    let directory = SeaOrmLinkDirectory::new(db, &DatabaseConfig::default());

    let mut value = link("1", "abc", "https://example.com", true);
    directory.upsert(&value).await.unwrap();
    value.active = false;
    directory.upsert(&value).await.unwrap();

    assert!(
        directory
            .find_active_link("short.ly", "abc")
            .await
            .unwrap()
            .is_none()
    );
    directory.health_check().await.unwrap();
}

#[tokio::test]
async fn test_directory_domain_is_stored_lower_case() {
    let (_dir, db) = setup().await;
    let directory = SeaOrmLinkDirectory::new(db, &DatabaseConfig::default());

    let mut value = link("1", "Promo", "https://example.com/promo", true);
    value.domain = "Short.LY".to_string();
    directory.upsert(&value).await.unwrap();

    let found = directory
        .find_active_link("short.ly", "Promo")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.domain, "short.ly");
    assert!(
        directory
            .find_active_link("SHORT.ly", "Promo")
            .await
            .unwrap()
            .is_some()
    );
}

// =============================================================================
// Click store
// =============================================================================

#[tokio::test]
async fn test_click_store_scans_in_key_order_with_paging() {
    let (_dir, db) = setup().await;
    let store = SeaOrmClickStore::new(db);

    for ts in [30, 10, 20, 40] {
        store
            .append(&click_key("short.ly/abc", ts).unwrap(), "{}")
            .await
            .unwrap();
    }
    // 其他链接不应出现在结果中
    store
        .append(&click_key("short.ly/abd", 15).unwrap(), "{}")
        .await
        .unwrap();

    let prefix = click_prefix("short.ly/abc");
    let first = store.scan_prefix(&prefix, None, 3).await.unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].0, click_key("short.ly/abc", 10).unwrap());
    assert_eq!(first[2].0, click_key("short.ly/abc", 30).unwrap());

    let rest = store
        .scan_prefix(&prefix, Some(&first[2].0), 3)
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].0, click_key("short.ly/abc", 40).unwrap());
}

#[tokio::test]
async fn test_click_store_prefix_is_literal() {
    let (_dir, db) = setup().await;
    let store = SeaOrmClickStore::new(db);

    // `_` 和 `%` 在 LIKE 中是通配符
    store
        .append(&click_key("short.ly/a_c", 1).unwrap(), "{}")
        .await
        .unwrap();
    store
        .append(&click_key("short.ly/abc", 2).unwrap(), "{}")
        .await
        .unwrap();
    store
        .append(&click_key("short.ly/a%", 3).unwrap(), "{}")
        .await
        .unwrap();

    let hits = store
        .scan_prefix(&click_prefix("short.ly/a_c"), None, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let hits = store
        .scan_prefix(&click_prefix("short.ly/a%"), None, 10)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_click_store_prefix_is_case_sensitive() {
    let (_dir, db) = setup().await;
    let store = SeaOrmClickStore::new(db);

    for ts in [1, 3] {
        store
            .append(&click_key("short.ly/ABC", ts).unwrap(), "{}")
            .await
            .unwrap();
    }
    store
        .append(&click_key("short.ly/abc", 2).unwrap(), "{}")
        .await
        .unwrap();

    // SQLite 的 LIKE 对 ASCII 不区分大小写
    let hits = store
        .scan_prefix(&click_prefix("short.ly/abc"), None, 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, click_key("short.ly/abc", 2).unwrap());

    let rest = store
        .scan_prefix(&click_prefix("short.ly/abc"), Some(&hits[0].0), 1)
        .await
        .unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_click_store_overwrites_same_key() {
    let (_dir, db) = setup().await;
    let store = SeaOrmClickStore::new(db);
    let key = click_key("short.ly/abc", 5).unwrap();

    store.append(&key, r#"{"referer":"a"}"#).await.unwrap();
    store.append(&key, r#"{"referer":"b"}"#).await.unwrap();

    let hits = store
        .scan_prefix(&click_prefix("short.ly/abc"), None, 10)
        .await
        .unwrap();
    assert_eq!(hits, vec![(key, r#"{"referer":"b"}"#.to_string())]);
}

#[tokio::test]
async fn test_recorder_over_sqlite() {
    let (_dir, db) = setup().await;
    let recorder = ClickRecorder::new(Arc::new(SeaOrmClickStore::new(db)), 2);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let recorder = recorder.clone();
            tokio::spawn(async move {
                let mut event = ClickEvent::at("short.ly/abc", 1_700_000_000_000 + i);
                event.user_agent_family = Some("Firefox".to_string());
                recorder.record(&event).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let timestamps = recorder
        .list_clicks("short.ly/abc")
        .collect_timestamps()
        .await
        .unwrap();
    assert_eq!(timestamps.len(), 20);
    assert!(timestamps.windows(2).all(|w| w[0] < w[1]));

    let mut cursor = recorder.list_clicks("short.ly/abc");
    let event = cursor.next_event().await.unwrap().unwrap();
    assert_eq!(event.timestamp, 1_700_000_000_000);
    assert_eq!(event.user_agent_family.as_deref(), Some("Firefox"));
}

// =============================================================================
// Factory
// =============================================================================

#[tokio::test]
async fn test_factory_builds_sqlite_storage() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = StaticConfig::default();
    config.database.database_url = format!(
        "sqlite://{}?mode=rwc",
        temp_dir.path().join("factory.db").display()
    );

    let storage = StorageFactory::create(&config).await.unwrap();
    assert_eq!(storage.directory.backend_name(), "database");
    assert_eq!(storage.clicks.backend_name(), "database");
    assert!(storage.db.is_some());
}

#[tokio::test]
async fn test_factory_builds_memory_storage() {
    let mut config = StaticConfig::default();
    config.database.backend = "memory".to_string();
    config.accounting.click_store = "memory".to_string();

    let storage = StorageFactory::create(&config).await.unwrap();
    assert_eq!(storage.directory.backend_name(), "memory");
    assert_eq!(storage.clicks.backend_name(), "memory");
    assert!(storage.db.is_none());
}
