//! JSON export functionality
//!
//! Wraps a full snapshot with export metadata.

use serde::Serialize;

use crate::metrics::Rating;
use crate::models::dashboard::DashboardSnapshot;
use crate::trends::window::SessionFilter;
use crate::EngineResult;

const EXPORT_VERSION: &str = "1.0.0";

/// Headline figures repeated at the top of the export
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub filter: SessionFilter,
    pub total_calls: u64,
    pub success_rate: f64,
    pub apdex: f64,
    pub overall_score: f64,
    pub rating: Rating,
    pub total_preferences: u64,
}

impl From<&DashboardSnapshot> for SnapshotSummary {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        Self {
            filter: snapshot.session.filter,
            total_calls: snapshot.network.summary.total_calls,
            success_rate: snapshot.network.summary.success_rate,
            apdex: snapshot.network.apdex,
            overall_score: snapshot.health.overall_score,
            rating: snapshot.health.rating,
            total_preferences: snapshot.preferences.total_preferences,
        }
    }
}

/// Complete export structure for JSON
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotExportJson<'a> {
    pub exported_at: String,
    pub export_version: &'static str,
    pub summary: SnapshotSummary,
    pub snapshot: &'a DashboardSnapshot,
}

/// Render a snapshot as JSON, optionally pretty printed
pub fn snapshot_to_json(snapshot: &DashboardSnapshot, pretty: bool) -> EngineResult<String> {
    let export = SnapshotExportJson {
        exported_at: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        summary: SnapshotSummary::from(snapshot),
        snapshot,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    Ok(json)
}
