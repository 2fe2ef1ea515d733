//! Dashboard aggregation
//!
//! Runs every analyzer over one filtered view of the inputs and assembles
//! the result into a [`DashboardSnapshot`].

use std::time::Instant;

use chrono::Utc;

use crate::config::EngineConfig;
use crate::metrics::endpoint::group_by_endpoint;
use crate::metrics::health::HealthScoreCalculator;
use crate::metrics::network::NetworkMetricsAnalyzer;
use crate::metrics::preferences::analyze_preferences;
use crate::models::dashboard::{DashboardSnapshot, SessionInfo};
use crate::models::preference::PreferenceRecord;
use crate::models::transaction::TransactionRecord;
use crate::trends::window::{filter_transactions_at, SessionFilter};
use crate::EngineResult;

/// Stateless snapshot builder bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct DashboardMetricsAggregator {
    config: EngineConfig,
}

impl DashboardMetricsAggregator {
    /// Wrap a configuration as-is; callers must have run
    /// [`EngineConfig::validate`]. Use [`Self::try_new`] otherwise.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration, then wrap it
    pub fn try_new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a snapshot for the window ending now
    pub fn aggregate(
        &self,
        transactions: &[TransactionRecord],
        preferences: &[PreferenceRecord],
        filter: SessionFilter,
    ) -> DashboardSnapshot {
        self.aggregate_at(transactions, preferences, filter, Utc::now().timestamp_millis())
    }

    /// Build a snapshot for the window ending at `now_ms`
    ///
    /// Only transactions are windowed; preferences are a point-in-time
    /// snapshot and always count in full.
    pub fn aggregate_at(
        &self,
        transactions: &[TransactionRecord],
        preferences: &[PreferenceRecord],
        filter: SessionFilter,
        now_ms: i64,
    ) -> DashboardSnapshot {
        let started = Instant::now();
        let filtered = filter_transactions_at(transactions, filter, now_ms);

        let network = NetworkMetricsAnalyzer::new(&self.config).analyze_enhanced(&filtered);
        let prefs = analyze_preferences(preferences);
        let health = HealthScoreCalculator::new(&self.config).calculate(&filtered, preferences);
        let session = session_info(&filtered, filter, now_ms);

        tracing::debug!(
            "Aggregated {} of {} transactions ({}), {} preferences in {:?}",
            filtered.len(),
            transactions.len(),
            filter.label(),
            preferences.len(),
            started.elapsed()
        );

        DashboardSnapshot {
            network,
            preferences: prefs,
            health,
            session,
            last_updated: now_ms,
        }
    }
}

fn session_info(filtered: &[TransactionRecord], filter: SessionFilter, now_ms: i64) -> SessionInfo {
    let start_time = filtered
        .iter()
        .map(|t| t.start_time)
        .min()
        .unwrap_or(now_ms);

    SessionInfo {
        session_id: format!("session-{}", start_time),
        start_time,
        end_time: None,
        filter,
        transaction_count: filtered.len() as u64,
        endpoint_count: group_by_endpoint(filtered).len() as u64,
    }
}
