use crate::core::depreciation::{Decision, DepreciationPolicy};
use crate::domain::model::{Listing, ListingUpdate, RecordFailure, RunSummary};
use crate::domain::ports::{Clock, ConfigProvider, DocumentStore, SystemClock};
use crate::utils::error::{Result, UpdaterError};
use crate::utils::monitor::SystemMonitor;
use futures::stream::{self, StreamExt};
use std::time::Instant;

pub const DEFAULT_COLLECTION: &str = "marketplace";
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Applies the depreciation policy to every listing of one collection.
pub struct DepreciationUpdater<S: DocumentStore> {
    store: S,
    clock: Box<dyn Clock>,
    policy: DepreciationPolicy,
    collection: String,
    concurrency: usize,
    monitor: SystemMonitor,
}

/// Listings read and classified, before any write.
#[derive(Debug, Default)]
pub struct Plan {
    pub scanned: usize,
    pub updates: Vec<ListingUpdate>,
    pub not_yet_due: usize,
    pub up_to_date: usize,
    pub malformed: Vec<String>,
}

impl<S: DocumentStore> DepreciationUpdater<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            policy: DepreciationPolicy::default(),
            collection: DEFAULT_COLLECTION.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            monitor: SystemMonitor::default(),
        }
    }

    pub fn from_config<C: ConfigProvider>(store: S, config: &C) -> Self {
        Self::new(store)
            .with_collection(config.collection())
            .with_policy(config.policy())
            .with_concurrency(config.concurrency())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_policy(mut self, policy: DepreciationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the collection and computes every pending update without writing.
    pub async fn plan(&self) -> Result<Plan> {
        let documents = self
            .store
            .list_all(&self.collection)
            .await
            .map_err(|e| match e {
                err @ UpdaterError::StoreReadError { .. } => err,
                other => UpdaterError::StoreReadError {
                    collection: self.collection.clone(),
                    message: other.to_string(),
                },
            })?;

        let now = self.clock.now();
        let mut plan = Plan {
            scanned: documents.len(),
            ..Plan::default()
        };

        for doc in &documents {
            let listing = match Listing::from_document(doc) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping listing: {}", e);
                    plan.malformed.push(doc.id.clone());
                    continue;
                }
            };

            match self.policy.decide(&listing, now) {
                Decision::NotYetDue => {
                    tracing::debug!(id = %listing.id, "Listing uploaded less than a day ago");
                    plan.not_yet_due += 1;
                }
                Decision::UpToDate => {
                    tracing::debug!(id = %listing.id, "Listing already depreciated for today");
                    plan.up_to_date += 1;
                }
                Decision::Update(result) => {
                    let update = result.into_update(&listing);
                    tracing::debug!(
                        id = %update.id,
                        days = update.days_elapsed,
                        price = update.price_per_kg,
                        freshness = update.freshness_score,
                        "Planned depreciation"
                    );
                    plan.updates.push(update);
                }
            }
        }

        Ok(plan)
    }

    /// One scheduled invocation: read all listings, write back decayed values.
    ///
    /// A read failure aborts the run. Write failures are collected per record
    /// in the returned summary and never stop the other writes.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!("🚀 Starting depreciation run on '{}'", self.collection);

        let plan = self.plan().await?;
        tracing::info!(
            "📥 Read {} listings, {} need an update",
            plan.scanned,
            plan.updates.len()
        );
        self.monitor.log_stats("Read");

        let total_updates = plan.updates.len();
        let outcomes: Vec<std::result::Result<String, RecordFailure>> =
            stream::iter(plan.updates)
                .map(|update| async move {
                    let fields = update.to_fields();
                    match self
                        .store
                        .update_fields(&self.collection, &update.id, &fields)
                        .await
                    {
                        Ok(()) => Ok(update.id),
                        Err(e) => {
                            tracing::error!(id = %update.id, "❌ Failed to update listing: {}", e);
                            Err(RecordFailure {
                                id: update.id,
                                error: e.to_string(),
                            })
                        }
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut summary = RunSummary {
            scanned: plan.scanned,
            not_yet_due: plan.not_yet_due,
            up_to_date: plan.up_to_date,
            malformed: plan.malformed,
            ..RunSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(_) => summary.updated += 1,
                Err(failure) => summary.failures.push(failure),
            }
        }
        summary.failures.sort_by(|a, b| a.id.cmp(&b.id));
        summary.elapsed = started.elapsed();

        if summary.has_failures() {
            tracing::warn!(
                "⚠️ {} of {} listing updates failed",
                summary.failures.len(),
                total_updates
            );
        }
        self.monitor.log_stats("Write");
        self.monitor.log_final_stats();
        summary.log();

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::model::{
        Document, FieldMap, FieldValue, FIELD_FRESHNESS_SCORE, FIELD_ORIGINAL_PRICE,
        FIELD_PRICE_PER_KG, FIELD_UPLOAD_DATE,
    };
    use crate::domain::ports::FixedClock;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn listing_doc(id: &str, days_old: i64, price: f64) -> Document {
        let mut fields = FieldMap::new();
        fields.insert(
            FIELD_UPLOAD_DATE.to_string(),
            FieldValue::Timestamp(now() - Duration::days(days_old) - Duration::hours(1)),
        );
        fields.insert(FIELD_PRICE_PER_KG.to_string(), FieldValue::Double(price));
        fields.insert(FIELD_FRESHNESS_SCORE.to_string(), FieldValue::Integer(10));
        fields.insert(
            "cropName".to_string(),
            FieldValue::String("Spinach".to_string()),
        );
        Document::new(id, fields)
    }

    async fn seeded(docs: Vec<Document>) -> MemoryStore {
        let store = MemoryStore::new();
        for doc in docs {
            store.insert(DEFAULT_COLLECTION, doc).await;
        }
        store
    }

    fn price_of(doc: &Document) -> f64 {
        doc.fields[FIELD_PRICE_PER_KG].as_f64().unwrap()
    }

    /// Fails writes for a fixed set of ids and delegates everything else.
    struct FlakyStore {
        inner: MemoryStore,
        failing: HashSet<String>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
            self.inner.list_all(collection).await
        }

        async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(id) {
                return Err(UpdaterError::StoreWriteError {
                    id: id.to_string(),
                    message: "deadline exceeded".to_string(),
                });
            }
            self.inner.update_fields(collection, id, fields).await
        }
    }

    struct UnreachableStore;

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn list_all(&self, _collection: &str) -> Result<Vec<Document>> {
            Err(UpdaterError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }

        async fn update_fields(&self, _: &str, _: &str, _: &FieldMap) -> Result<()> {
            panic!("no writes expected after a failed read");
        }
    }

    #[tokio::test]
    async fn test_run_on_empty_collection() {
        let updater = DepreciationUpdater::new(MemoryStore::new()).with_clock(FixedClock(now()));

        let summary = updater.run().await.unwrap();

        assert_eq!(summary.scanned, 0);
        assert_eq!(summary.updated, 0);
        assert!(!summary.has_failures());
        assert_eq!(updater.store().write_count().await, 0);
    }

    #[tokio::test]
    async fn test_run_depreciates_listings() {
        let store = seeded(vec![
            listing_doc("fresh", 0, 100.0),
            listing_doc("one-day", 1, 100.0),
            listing_doc("five-days", 5, 100.0),
            listing_doc("month-old", 30, 100.0),
        ])
        .await;
        let updater = DepreciationUpdater::new(store).with_clock(FixedClock(now()));

        let summary = updater.run().await.unwrap();

        assert_eq!(summary.scanned, 4);
        assert_eq!(summary.updated, 3);
        assert_eq!(summary.not_yet_due, 1);

        let store = updater.store();
        let fresh = store.get(DEFAULT_COLLECTION, "fresh").await.unwrap();
        assert_eq!(fresh, listing_doc("fresh", 0, 100.0));

        let one_day = store.get(DEFAULT_COLLECTION, "one-day").await.unwrap();
        assert!((price_of(&one_day) - 95.0).abs() < 1e-9);
        assert_eq!(one_day.fields[FIELD_FRESHNESS_SCORE], FieldValue::Integer(9));
        assert_eq!(one_day.fields[FIELD_ORIGINAL_PRICE], FieldValue::Double(100.0));
        assert_eq!(
            one_day.fields["cropName"],
            FieldValue::String("Spinach".to_string())
        );

        let five = store.get(DEFAULT_COLLECTION, "five-days").await.unwrap();
        assert!((price_of(&five) - 75.0).abs() < 1e-9);
        assert_eq!(five.fields[FIELD_FRESHNESS_SCORE], FieldValue::Integer(5));

        let old = store.get(DEFAULT_COLLECTION, "month-old").await.unwrap();
        assert_eq!(price_of(&old), 0.0);
        assert_eq!(old.fields[FIELD_FRESHNESS_SCORE], FieldValue::Integer(0));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_idempotent() {
        let store = seeded(vec![listing_doc("a", 3, 80.0), listing_doc("b", 7, 20.0)]).await;
        let updater = DepreciationUpdater::new(store).with_clock(FixedClock(now()));

        let first = updater.run().await.unwrap();
        let after_first = updater.store().snapshot(DEFAULT_COLLECTION).await;
        let second = updater.run().await.unwrap();
        let after_second = updater.store().snapshot(DEFAULT_COLLECTION).await;

        assert_eq!(first.updated, 2);
        assert_eq!(second.updated, 0);
        assert_eq!(second.up_to_date, 2);
        assert_eq!(after_first, after_second);
        assert_eq!(updater.store().write_count().await, 2);
    }

    #[tokio::test]
    async fn test_next_day_run_uses_original_price() {
        let store = seeded(vec![listing_doc("a", 1, 100.0)]).await;
        let updater = DepreciationUpdater::new(store).with_clock(FixedClock(now()));
        updater.run().await.unwrap();

        let updater = DepreciationUpdater::new(updater.store().clone())
            .with_clock(FixedClock(now() + Duration::days(1)));
        updater.run().await.unwrap();

        let doc = updater.store().get(DEFAULT_COLLECTION, "a").await.unwrap();
        // 100 * (1 - 0.10), not 95 * (1 - 0.10)
        assert!((price_of(&doc) - 90.0).abs() < 1e-9);
        assert_eq!(doc.fields[FIELD_FRESHNESS_SCORE], FieldValue::Integer(8));
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_other_updates() {
        let inner = seeded(vec![
            listing_doc("ok-1", 2, 50.0),
            listing_doc("broken", 2, 50.0),
            listing_doc("ok-2", 4, 50.0),
        ])
        .await;
        let store = FlakyStore {
            inner: inner.clone(),
            failing: HashSet::from(["broken".to_string()]),
            writes: AtomicUsize::new(0),
        };
        let updater = DepreciationUpdater::new(store)
            .with_clock(FixedClock(now()))
            .with_concurrency(1);

        let summary = updater.run().await.unwrap();

        assert_eq!(updater.store().writes.load(Ordering::SeqCst), 3);
        assert_eq!(summary.updated, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].id, "broken");
        assert!(summary.failures[0].error.contains("deadline exceeded"));

        let ok_2 = inner.get(DEFAULT_COLLECTION, "ok-2").await.unwrap();
        assert!((price_of(&ok_2) - 40.0).abs() < 1e-9);
        let broken = inner.get(DEFAULT_COLLECTION, "broken").await.unwrap();
        assert_eq!(price_of(&broken), 50.0);
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let mut no_date = listing_doc("no-date", 3, 10.0);
        no_date.fields.remove(FIELD_UPLOAD_DATE);
        let mut no_price = listing_doc("no-price", 3, 10.0);
        no_price.fields.remove(FIELD_PRICE_PER_KG);

        let store = seeded(vec![no_date, no_price, listing_doc("good", 3, 10.0)]).await;
        let updater = DepreciationUpdater::new(store).with_clock(FixedClock(now()));

        let summary = updater.run().await.unwrap();

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.updated, 1);
        let mut malformed = summary.malformed.clone();
        malformed.sort();
        assert_eq!(malformed, vec!["no-date", "no-price"]);
    }

    #[tokio::test]
    async fn test_read_failure_aborts_run() {
        let updater = DepreciationUpdater::new(UnreachableStore).with_clock(FixedClock(now()));

        let err = updater.run().await.unwrap_err();

        assert!(matches!(err, UpdaterError::StoreReadError { ref collection, .. } if collection == "marketplace"));
    }

    #[tokio::test]
    async fn test_plan_does_not_write() {
        let store = seeded(vec![listing_doc("a", 2, 10.0), listing_doc("b", 0, 10.0)]).await;
        let updater = DepreciationUpdater::new(store)
            .with_clock(FixedClock(now()))
            .with_collection(DEFAULT_COLLECTION);

        let plan = updater.plan().await.unwrap();

        assert_eq!(plan.scanned, 2);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, "a");
        assert_eq!(plan.not_yet_due, 1);
        assert_eq!(updater.store().write_count().await, 0);
    }
}
