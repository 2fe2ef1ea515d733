//! Session window filtering
//!
//! Selects the transactions that fall inside a trailing time window.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::transaction::TransactionRecord;
use crate::EngineError;

/// Trailing window the dashboard is scoped to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFilter {
    /// Last hour, used as a stand-in for "the current app session"
    #[default]
    LastSession,
    /// Last 24 hours
    #[serde(rename = "last_24h")]
    Last24h,
}

impl SessionFilter {
    /// Length of the trailing window
    pub fn window(&self) -> ChronoDuration {
        match self {
            Self::LastSession => ChronoDuration::hours(1),
            Self::Last24h => ChronoDuration::hours(24),
        }
    }

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::LastSession => "Last Session",
            Self::Last24h => "Last 24 Hours",
        }
    }

    /// Earliest start time (epoch ms) still inside the window ending at `now_ms`
    pub fn cutoff_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.window().num_milliseconds()
    }
}

impl std::str::FromStr for SessionFilter {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_session" | "session" => Ok(SessionFilter::LastSession),
            "last_24h" | "24h" => Ok(SessionFilter::Last24h),
            _ => Err(EngineError::Config(format!(
                "Invalid session filter: {}. Use 'last_session' or 'last_24h'",
                s
            ))),
        }
    }
}

/// Keep transactions that started inside the window ending now
pub fn filter_transactions(records: &[TransactionRecord], filter: SessionFilter) -> Vec<TransactionRecord> {
    filter_transactions_at(records, filter, Utc::now().timestamp_millis())
}

/// Keep transactions with `start_time >= now_ms - window`
pub fn filter_transactions_at(
    records: &[TransactionRecord],
    filter: SessionFilter,
    now_ms: i64,
) -> Vec<TransactionRecord> {
    let cutoff = filter.cutoff_ms(now_ms);
    records
        .iter()
        .filter(|r| r.start_time >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::completed;

    const NOW: i64 = 1_760_000_000_000;
    const MINUTE: i64 = 60_000;

    #[test]
    fn test_windows() {
        assert_eq!(SessionFilter::LastSession.window().num_minutes(), 60);
        assert_eq!(SessionFilter::Last24h.window().num_hours(), 24);
    }

    #[test]
    fn test_last_session_keeps_last_hour() {
        let records = vec![
            completed("a", "GET", "/a", NOW - 10 * MINUTE, 100, 200),
            completed("b", "GET", "/b", NOW - 60 * MINUTE, 100, 200),
            completed("c", "GET", "/c", NOW - 61 * MINUTE, 100, 200),
        ];

        let filtered = filter_transactions_at(&records, SessionFilter::LastSession, NOW);
        let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
        // The boundary itself is inclusive
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_last_24h_keeps_more() {
        let records = vec![
            completed("a", "GET", "/a", NOW - 2 * 60 * MINUTE, 100, 200),
            completed("b", "GET", "/b", NOW - 25 * 60 * MINUTE, 100, 200),
        ];

        let session = filter_transactions_at(&records, SessionFilter::LastSession, NOW);
        let day = filter_transactions_at(&records, SessionFilter::Last24h, NOW);
        assert!(session.is_empty());
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].id, "a");
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_transactions_at(&[], SessionFilter::Last24h, NOW).is_empty());
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("last_session".parse::<SessionFilter>().unwrap(), SessionFilter::LastSession);
        assert_eq!("LAST_24H".parse::<SessionFilter>().unwrap(), SessionFilter::Last24h);
        assert!("weekly".parse::<SessionFilter>().is_err());
    }

    #[test]
    fn test_filter_serialization() {
        assert_eq!(serde_json::to_string(&SessionFilter::Last24h).unwrap(), "\"last_24h\"");
        assert_eq!(
            serde_json::to_string(&SessionFilter::LastSession).unwrap(),
            "\"last_session\""
        );
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(SessionFilter::default(), SessionFilter::LastSession);
    }
}
