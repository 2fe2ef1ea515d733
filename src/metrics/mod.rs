//! Metrics calculation module
//!
//! This module handles computing dashboard metrics:
//! - Latency percentiles and Apdex
//! - Endpoint normalization and rankings
//! - Network aggregates and distributions
//! - Preference breakdowns
//! - Weighted health scoring

pub mod endpoint;
pub mod health;
pub mod network;
pub mod percentile;
pub mod preferences;

use serde::{Deserialize, Serialize};

use crate::config::{ApdexBounds, RatingBounds};

/// Five-level rating shared by the health score and network performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    #[default]
    Excellent,
    Good,
    Average,
    Poor,
    Critical,
}

impl Rating {
    /// Bucket a 0-100 health score
    pub fn from_score(score: f64, bounds: &RatingBounds) -> Self {
        if score >= bounds.excellent {
            Self::Excellent
        } else if score >= bounds.good {
            Self::Good
        } else if score >= bounds.average {
            Self::Average
        } else if score >= bounds.poor {
            Self::Poor
        } else {
            Self::Critical
        }
    }

    /// Rate network performance from error rate (%) and Apdex
    pub fn from_performance(error_rate: f64, apdex: f64, bounds: &ApdexBounds) -> Self {
        if error_rate > bounds.critical_error_rate {
            Self::Critical
        } else if apdex < bounds.poor {
            Self::Poor
        } else if apdex < bounds.average {
            Self::Average
        } else if apdex < bounds.good {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
            Self::Critical => "Critical",
        }
    }
}
