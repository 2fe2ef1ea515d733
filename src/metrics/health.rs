//! Health scoring
//!
//! Combines four 0-100 sub-scores into one weighted health score:
//! - Network performance (mean successful duration)
//! - Error rate (4xx/5xx share of completed requests)
//! - Response time (mean successful duration, stricter scale)
//! - System resources (preference footprint)

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::finite_or_zero;
use crate::models::preference::PreferenceRecord;
use crate::models::transaction::TransactionRecord;

use super::Rating;

/// Score returned when there are no transactions at all
pub const EMPTY_SCORE: f64 = 85.0;

/// Uptime estimate while the error rate stays under this (%)
const LOW_ERROR_RATE: f64 = 5.0;
const LOW_ERROR_UPTIME: f64 = 99.9;

/// The four sub-scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthFactors {
    pub network_performance: f64,
    pub error_rate: f64,
    pub response_time: f64,
    pub system_resources: f64,
}

/// Headline numbers shown next to the score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// Completed requests (response present)
    pub total_requests: u64,
    /// Percentage of completed requests with status >= 400
    pub error_rate: f64,
    /// Mean duration (ms) of successful requests
    pub avg_response_time: f64,
    /// Estimated uptime percentage, in [0, 100]
    pub uptime: f64,
}

/// Overall health of the captured traffic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub overall_score: f64,
    pub rating: Rating,
    pub factors: HealthFactors,
    pub key_metrics: KeyMetrics,
}

impl HealthScore {
    /// Fixed result for an empty transaction set
    pub fn empty() -> Self {
        Self {
            overall_score: EMPTY_SCORE,
            rating: Rating::Good,
            factors: HealthFactors {
                network_performance: 0.0,
                error_rate: 0.0,
                response_time: 0.0,
                system_resources: 0.0,
            },
            key_metrics: KeyMetrics {
                total_requests: 0,
                error_rate: 0.0,
                avg_response_time: 0.0,
                uptime: 100.0,
            },
        }
    }
}

/// Uptime estimate from the completed-request error rate
///
/// 99.9% below 5% errors, otherwise 95 + (5 - error rate), clamped to [0, 100].
pub fn estimate_uptime(error_rate: f64) -> f64 {
    if error_rate < LOW_ERROR_RATE {
        LOW_ERROR_UPTIME
    } else {
        (95.0 + (LOW_ERROR_RATE - error_rate)).clamp(0.0, 100.0)
    }
}

/// Computes [`HealthScore`]s using the scales of one [`EngineConfig`]
pub struct HealthScoreCalculator<'a> {
    config: &'a EngineConfig,
}

impl<'a> HealthScoreCalculator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Score session-filtered transactions together with the full preference snapshot
    pub fn calculate(
        &self,
        transactions: &[TransactionRecord],
        preferences: &[PreferenceRecord],
    ) -> HealthScore {
        if transactions.is_empty() {
            return HealthScore::empty();
        }

        let successful_durations: Vec<i64> = transactions
            .iter()
            .filter(|t| t.is_successful())
            .filter_map(|t| t.duration())
            .collect();
        let avg_successful = if successful_durations.is_empty() {
            None
        } else {
            let sum: i64 = successful_durations.iter().sum();
            Some(finite_or_zero(sum as f64 / successful_durations.len() as f64))
        };

        let completed: Vec<&TransactionRecord> =
            transactions.iter().filter(|t| t.response.is_some()).collect();
        let error_count = completed
            .iter()
            .filter(|t| t.status_code().is_some_and(|code| code >= 400))
            .count();
        let error_rate = if completed.is_empty() {
            0.0
        } else {
            finite_or_zero(error_count as f64 / completed.len() as f64 * 100.0)
        };

        let factors = HealthFactors {
            network_performance: avg_successful
                .map(|avg| self.config.network_performance.score(avg))
                .unwrap_or(self.config.network_performance_no_data),
            error_rate: self.config.error_rate.score(error_rate),
            response_time: avg_successful
                .map(|avg| self.config.response_time.score(avg))
                .unwrap_or(self.config.response_time.fallback),
            system_resources: self.config.system_resources.score(preferences.len() as f64),
        };

        let w = &self.config.weights;
        let weighted = factors.network_performance * w.network_performance
            + factors.error_rate * w.error_rate
            + factors.response_time * w.response_time
            + factors.system_resources * w.system_resources;
        let overall_score = finite_or_zero(weighted).clamp(0.0, 100.0);

        tracing::trace!(
            "health: {:?} -> {:.1} ({} completed, {:.2}% errors)",
            factors,
            overall_score,
            completed.len(),
            error_rate
        );

        HealthScore {
            overall_score,
            rating: Rating::from_score(overall_score, &self.config.rating_bounds),
            factors,
            key_metrics: KeyMetrics {
                total_requests: completed.len() as u64,
                error_rate,
                avg_response_time: avg_successful.unwrap_or(0.0),
                uptime: estimate_uptime(error_rate),
            },
        }
    }
}
