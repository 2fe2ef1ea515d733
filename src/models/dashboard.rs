//! Dashboard snapshot types

use serde::{Deserialize, Serialize};

use crate::metrics::health::HealthScore;
use crate::metrics::network::EnhancedNetworkMetrics;
use crate::metrics::preferences::PreferencesMetrics;
use crate::trends::window::SessionFilter;

/// Describes the session window a snapshot was computed over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// `session-<start_time>`
    pub session_id: String,
    /// Earliest start time in the window, or the computation time if empty
    pub start_time: i64,
    /// Sessions are open-ended; always None
    pub end_time: Option<i64>,
    pub filter: SessionFilter,
    pub transaction_count: u64,
    pub endpoint_count: u64,
}

/// Everything the dashboard renders, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub network: EnhancedNetworkMetrics,
    pub preferences: PreferencesMetrics,
    pub health: HealthScore,
    pub session: SessionInfo,
    /// Epoch ms when the snapshot was computed
    pub last_updated: i64,
}
