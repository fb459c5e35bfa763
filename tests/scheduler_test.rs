use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use crop_depreciation::domain::model::{Document, FieldMap, FieldValue};
use crop_depreciation::domain::ports::DocumentStore;
use crop_depreciation::{run_on_schedule, DepreciationUpdater, MemoryStore, Schedule, UpdaterError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Counts reads; every read fails.
#[derive(Default)]
struct OfflineStore {
    reads: AtomicU32,
}

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn list_all(&self, collection: &str) -> crop_depreciation::Result<Vec<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Err(UpdaterError::StoreReadError {
            collection: collection.to_string(),
            message: "unavailable".to_string(),
        })
    }

    async fn update_fields(&self, _: &str, _: &str, _: &FieldMap) -> crop_depreciation::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_scheduler_stops_after_max_runs() {
    let mut fields = FieldMap::new();
    fields.insert(
        "uploadDate".to_string(),
        FieldValue::Timestamp(Utc::now() - ChronoDuration::days(2)),
    );
    fields.insert("pricePerKg".to_string(), FieldValue::Double(10.0));
    let store = MemoryStore::from_documents("marketplace", vec![Document::new("beans", fields)]);
    let updater = DepreciationUpdater::new(store.clone());

    let schedule = Schedule::every(Duration::from_millis(10)).with_max_runs(3);
    let runs = run_on_schedule(&updater, schedule, std::future::pending()).await;

    assert_eq!(runs, 3);
    // 第一次執行後價格已是最新，之後不再寫入
    assert_eq!(store.write_count().await, 1);
}

#[tokio::test]
async fn test_scheduler_keeps_running_after_failed_runs() {
    let updater = DepreciationUpdater::new(OfflineStore::default());

    let schedule = Schedule::every(Duration::from_millis(5)).with_max_runs(2);
    let runs = run_on_schedule(&updater, schedule, std::future::pending()).await;

    assert_eq!(runs, 2);
    assert_eq!(updater.store().reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_scheduler_stops_on_shutdown() {
    let updater = DepreciationUpdater::new(MemoryStore::new());

    let schedule = Schedule::every(Duration::from_secs(3600));
    let runs = run_on_schedule(
        &updater,
        schedule,
        tokio::time::sleep(Duration::from_millis(50)),
    )
    .await;

    // 立即執行一次，之後等到關閉
    assert_eq!(runs, 1);
}

#[tokio::test]
async fn test_scheduler_with_zero_run_limit_does_nothing() {
    let updater = DepreciationUpdater::new(OfflineStore::default());

    let schedule = Schedule::every(Duration::from_millis(5)).with_max_runs(0);
    let runs = run_on_schedule(&updater, schedule, std::future::pending()).await;

    assert_eq!(runs, 0);
    assert_eq!(updater.store().reads.load(Ordering::SeqCst), 0);
}
