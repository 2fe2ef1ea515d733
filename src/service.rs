//! Refresh service
//!
//! Wraps the aggregator for host applications: fetches inputs from the
//! host's sources, computes off the async runtime under a time budget, and
//! keeps the last good snapshot per filter to fall back on.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::aggregator::DashboardMetricsAggregator;
use crate::config::EngineConfig;
use crate::models::dashboard::DashboardSnapshot;
use crate::models::preference::PreferenceRecord;
use crate::models::transaction::TransactionRecord;
use crate::trends::window::SessionFilter;
use crate::{EngineError, EngineResult};

/// Supplies captured transactions
pub trait TransactionSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = EngineResult<Vec<TransactionRecord>>> + Send;
}

/// Supplies the current preference snapshot
pub trait PreferenceSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = EngineResult<Vec<PreferenceRecord>>> + Send;
}

/// In-memory source returning a fixed set of records
#[derive(Debug, Clone, Default)]
pub struct StaticSource<R> {
    records: Vec<R>,
}

impl<R> StaticSource<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records }
    }
}

impl TransactionSource for StaticSource<TransactionRecord> {
    fn fetch(&self) -> impl Future<Output = EngineResult<Vec<TransactionRecord>>> + Send {
        let records = self.records.clone();
        async move { Ok(records) }
    }
}

impl PreferenceSource for StaticSource<PreferenceRecord> {
    fn fetch(&self) -> impl Future<Output = EngineResult<Vec<PreferenceRecord>>> + Send {
        let records = self.records.clone();
        async move { Ok(records) }
    }
}

/// Last good snapshot per filter, with the time it was stored
struct SnapshotCache {
    data: HashMap<SessionFilter, (Instant, DashboardSnapshot)>,
    ttl: Duration,
}

impl SnapshotCache {
    fn new(ttl_secs: u64) -> Self {
        Self {
            data: HashMap::new(),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Snapshot younger than the TTL
    fn get_fresh(&self, filter: SessionFilter) -> Option<DashboardSnapshot> {
        self.data.get(&filter).and_then(|(time, snapshot)| {
            if time.elapsed() < self.ttl {
                Some(snapshot.clone())
            } else {
                None
            }
        })
    }

    fn get_any(&self, filter: SessionFilter) -> Option<DashboardSnapshot> {
        self.data.get(&filter).map(|(_, snapshot)| snapshot.clone())
    }

    fn set(&mut self, filter: SessionFilter, snapshot: DashboardSnapshot) {
        self.data.insert(filter, (Instant::now(), snapshot));
    }
}

/// Cached, timeout-guarded dashboard refreshes
pub struct DashboardService<T, P> {
    transactions: T,
    preferences: P,
    aggregator: Arc<DashboardMetricsAggregator>,
    cache: Mutex<SnapshotCache>,
}

impl<T: TransactionSource, P: PreferenceSource> DashboardService<T, P> {
    /// Build a service around an already validated configuration;
    /// see [`Self::try_new`]
    pub fn new(transactions: T, preferences: P, config: EngineConfig) -> Self {
        let cache = SnapshotCache::new(config.cache_ttl_secs);
        Self {
            transactions,
            preferences,
            aggregator: Arc::new(DashboardMetricsAggregator::new(config)),
            cache: Mutex::new(cache),
        }
    }

    /// Validate the configuration, then build the service
    pub fn try_new(transactions: T, preferences: P, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::new(transactions, preferences, config))
    }

    pub fn config(&self) -> &EngineConfig {
        self.aggregator.config()
    }

    /// Recompute the snapshot for `filter`
    ///
    /// On timeout or failure the last good snapshot for the same filter is
    /// returned instead; the error only surfaces when there is none.
    /// A timed-out aggregation is abandoned, not cancelled: the blocking
    /// task runs to completion and its result is discarded.
    pub async fn refresh(&self, filter: SessionFilter) -> EngineResult<DashboardSnapshot> {
        let timeout_ms = self.config().refresh_timeout_ms;
        let started = Instant::now();

        let result = match tokio::time::timeout(Duration::from_millis(timeout_ms), self.compute(filter)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(timeout_ms)),
        };

        match result {
            Ok(snapshot) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.set(filter, snapshot.clone());
                }
                info!(
                    "Dashboard refreshed ({}, {} transactions) in {:?}",
                    filter.label(),
                    snapshot.session.transaction_count,
                    started.elapsed()
                );
                Ok(snapshot)
            }
            Err(e) => match self.cached(filter) {
                Some(previous) => {
                    warn!("Refresh failed ({}), serving cached snapshot: {}", filter.label(), e);
                    Ok(previous)
                }
                None => {
                    error!("Refresh failed ({}) with no cached snapshot: {}", filter.label(), e);
                    Err(e)
                }
            },
        }
    }

    /// Cached snapshot if still within the TTL, otherwise a fresh one
    pub async fn snapshot(&self, filter: SessionFilter) -> EngineResult<DashboardSnapshot> {
        let fresh = self.cache.lock().ok().and_then(|cache| cache.get_fresh(filter));
        if let Some(snapshot) = fresh {
            debug!("Serving cached snapshot for {}", filter.label());
            return Ok(snapshot);
        }
        self.refresh(filter).await
    }

    /// Last good snapshot for `filter`, regardless of age
    pub fn cached(&self, filter: SessionFilter) -> Option<DashboardSnapshot> {
        self.cache.lock().ok().and_then(|cache| cache.get_any(filter))
    }

    /// Drop every cached snapshot
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.data.clear();
        }
        debug!("Snapshot cache cleared");
    }

    async fn compute(&self, filter: SessionFilter) -> EngineResult<DashboardSnapshot> {
        let (transactions, preferences) =
            futures::try_join!(self.transactions.fetch(), self.preferences.fetch())?;

        let aggregator = Arc::clone(&self.aggregator);
        tokio::task::spawn_blocking(move || aggregator.aggregate(&transactions, &preferences, filter))
            .await
            .map_err(|e| EngineError::Internal(format!("Aggregation task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{completed, string_prefs};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn recent_transactions(n: usize) -> Vec<TransactionRecord> {
        let now = chrono::Utc::now().timestamp_millis();
        (0..n)
            .map(|i| completed(&i.to_string(), "GET", "/api/items", now - 1_000 * i as i64, 100, 200))
            .collect()
    }

    /// Counts fetches and can be switched to fail or stall
    #[derive(Default)]
    struct ScriptedSource {
        records: Vec<TransactionRecord>,
        fetches: AtomicUsize,
        failing: AtomicBool,
        stall: AtomicBool,
    }

    impl ScriptedSource {
        fn new(records: Vec<TransactionRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }
    }

    impl TransactionSource for Arc<ScriptedSource> {
        fn fetch(&self) -> impl Future<Output = EngineResult<Vec<TransactionRecord>>> + Send {
            let source = Arc::clone(self);
            async move {
                source.fetches.fetch_add(1, Ordering::SeqCst);
                if source.stall.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                if source.failing.load(Ordering::SeqCst) {
                    return Err(EngineError::Source("capture store unavailable".to_string()));
                }
                Ok(source.records.clone())
            }
        }
    }

    fn no_prefs() -> StaticSource<PreferenceRecord> {
        StaticSource::new(Vec::new())
    }

    fn config(ttl_secs: u64) -> EngineConfig {
        EngineConfig {
            refresh_timeout_ms: 50,
            cache_ttl_secs: ttl_secs,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_refresh_with_static_sources() {
        let service = DashboardService::new(
            StaticSource::new(recent_transactions(4)),
            StaticSource::new(string_prefs(3)),
            EngineConfig::default(),
        );
        let snapshot = service.refresh(SessionFilter::LastSession).await.unwrap();

        assert_eq!(snapshot.network.summary.total_calls, 4);
        assert_eq!(snapshot.preferences.total_preferences, 3);
        assert_eq!(service.cached(SessionFilter::LastSession), Some(snapshot));
        assert!(service.cached(SessionFilter::Last24h).is_none());
    }

    #[tokio::test]
    async fn test_try_new_validates_config() {
        let mut bad = EngineConfig::default();
        bad.weights.error_rate = 0.9;
        let result = DashboardService::try_new(StaticSource::new(recent_transactions(1)), no_prefs(), bad);
        assert!(matches!(result, Err(EngineError::Config(_))));

        let service =
            DashboardService::try_new(StaticSource::new(recent_transactions(1)), no_prefs(), EngineConfig::default())
                .unwrap();
        assert_eq!(service.refresh(SessionFilter::LastSession).await.unwrap().network.summary.total_calls, 1);
    }

    #[tokio::test]
    async fn test_snapshot_uses_cache_within_ttl() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(2)));
        let service = DashboardService::new(source.clone(), no_prefs(), config(30));

        let first = service.snapshot(SessionFilter::LastSession).await.unwrap();
        let second = service.snapshot(SessionFilter::LastSession).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        // Cache is keyed by filter
        service.snapshot(SessionFilter::Last24h).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_snapshot_refreshes_after_ttl() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(2)));
        let service = DashboardService::new(source.clone(), no_prefs(), config(0));

        service.snapshot(SessionFilter::LastSession).await.unwrap();
        service.snapshot(SessionFilter::LastSession).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(2)));
        let service = DashboardService::new(source.clone(), no_prefs(), config(30));

        service.snapshot(SessionFilter::LastSession).await.unwrap();
        service.invalidate();
        assert!(service.cached(SessionFilter::LastSession).is_none());
        service.snapshot(SessionFilter::LastSession).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_source_failure_without_cache_is_error() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        source.failing.store(true, Ordering::SeqCst);
        let service = DashboardService::new(source, no_prefs(), config(30));

        let err = service.refresh(SessionFilter::LastSession).await.unwrap_err();
        assert!(matches!(err, EngineError::Source(_)));
    }

    #[tokio::test]
    async fn test_source_failure_falls_back_to_cache() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(3)));
        let service = DashboardService::new(source.clone(), no_prefs(), config(0));

        let good = service.refresh(SessionFilter::LastSession).await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        let fallback = service.refresh(SessionFilter::LastSession).await.unwrap();
        assert_eq!(fallback, good);
    }

    #[tokio::test]
    async fn test_timeout_without_cache_is_error() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(1)));
        source.stall.store(true, Ordering::SeqCst);
        let service = DashboardService::new(source, no_prefs(), config(30));

        let err = service.refresh(SessionFilter::Last24h).await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_cache() {
        let source = Arc::new(ScriptedSource::new(recent_transactions(5)));
        let service = DashboardService::new(source.clone(), no_prefs(), config(0));

        let good = service.refresh(SessionFilter::Last24h).await.unwrap();
        source.stall.store(true, Ordering::SeqCst);
        let fallback = service.refresh(SessionFilter::Last24h).await.unwrap();
        assert_eq!(fallback.last_updated, good.last_updated);
        assert_eq!(fallback.network.summary.total_calls, 5);
    }
}
