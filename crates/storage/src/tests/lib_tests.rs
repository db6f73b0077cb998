use super::*;
use crate::test_support::memory_storage;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = memory_storage().await;
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("sales_admin_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn migrations_create_tables_and_commission_view() {
    let storage = memory_storage().await;
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY name",
    )
    .fetch_all(storage.pool())
    .await
    .expect("schema");
    for expected in [
        "addresses",
        "clients",
        "sales",
        "sales_commission_view",
        "sellers",
        "users",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
}

#[test]
fn page_request_starts_at_one_and_clamps_page_size() {
    let first = PageRequest::new(0);
    assert_eq!(first.page, 1);
    assert_eq!(first.per_page, DEFAULT_PER_PAGE);
    assert_eq!(first.offset(), 0);

    let third = PageRequest::new(3);
    assert_eq!(third.offset(), 20);
    assert_eq!(third.limit(), 10);

    assert_eq!(PageRequest::with_per_page(1, 0).per_page, 1);
    assert_eq!(PageRequest::with_per_page(1, 5_000).per_page, MAX_PER_PAGE);
}

#[test]
fn memory_and_foreign_urls_have_no_file_path() {
    assert!(sqlite_path("sqlite::memory:").is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/app.db?mode=rwc"),
        Some(PathBuf::from("./data/app.db"))
    );
}
