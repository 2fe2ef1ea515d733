//! Trend analysis module
//!
//! This module handles time-based views of the captured traffic:
//! - Session window filtering
//! - Request-rate time series for charts, capped to a fixed number of points

pub mod series;
pub mod window;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Time series data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Bucket start, epoch ms
    pub timestamp: i64,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            label: None,
        }
    }

    /// Label the point with its UTC wall-clock time (`HH:MM`)
    pub fn with_time_label(mut self) -> Self {
        self.label = DateTime::from_timestamp_millis(self.timestamp)
            .map(|dt| dt.format("%H:%M").to_string());
        self
    }
}
