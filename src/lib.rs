//! Pulseboard - Dashboard Analytics Engine
//!
//! This library turns captured network transactions and preference
//! snapshots into the metrics shown on an inspection dashboard.
//! It handles:
//! - Session window filtering
//! - Network statistics (percentiles, Apdex, endpoint rankings, time series)
//! - Preference breakdowns
//! - Weighted health scoring
//! - Cached, timeout-guarded refreshes for host applications
//!
//! The engine itself is a pure function of its inputs; see
//! [`aggregator::DashboardMetricsAggregator`].

pub mod aggregator;
pub mod config;
pub mod export;
pub mod metrics;
pub mod models;
pub mod service;
pub mod trends;

#[cfg(test)]
pub(crate) mod testutil;

pub use aggregator::DashboardMetricsAggregator;
pub use config::EngineConfig;
pub use models::dashboard::DashboardSnapshot;
pub use service::DashboardService;
pub use trends::window::SessionFilter;

/// Error type for the fallible outer surfaces (config, sources, refresh, export)
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Refresh timed out after {0} ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Hosts that forward errors over IPC only need the message
impl serde::Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type for fallible engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Install a stdout `tracing` subscriber at INFO.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Replace NaN and infinities with zero before a value reaches an output type
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
