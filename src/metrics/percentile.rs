//! Latency statistics
//!
//! Interpolated percentiles and the Apdex score.

use serde::{Deserialize, Serialize};

use crate::finite_or_zero;

/// Percentile of an ascending-sorted sample, by linear interpolation
///
/// rank = p/100 * (n - 1), i = floor(rank), f = rank - i; the result is
/// `sorted[i] * (1 - f) + sorted[i + 1] * f`. Returns 0 for an empty sample.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let fraction = rank - lower as f64;

    if lower + 1 >= n {
        return finite_or_zero(sorted[n - 1]);
    }

    let (low, high) = (sorted[lower], sorted[lower + 1]);
    let value = low * (1.0 - fraction) + high * fraction;
    // Rounding may land just outside [low, high]; keep percentiles monotonic
    finite_or_zero(value.max(low).min(high))
}

/// Percentile of an unsorted sample
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted_copy(values), p)
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// The dashboard's fixed percentile set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Compute all four percentiles with a single sort
    pub fn from_values(values: &[f64]) -> Self {
        let sorted = sorted_copy(values);
        Self {
            p50: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            p95: percentile_sorted(&sorted, 95.0),
            p99: percentile_sorted(&sorted, 99.0),
        }
    }

    pub fn from_durations(durations: &[i64]) -> Self {
        let values: Vec<f64> = durations.iter().map(|&d| d as f64).collect();
        Self::from_values(&values)
    }
}

/// Application Performance Index for a latency sample
///
/// satisfied: latency <= T, tolerated: T < latency <= 4T.
/// Apdex = (satisfied + tolerated / 2) / n, and 1.0 for an empty sample.
pub fn apdex(latencies_ms: &[i64], threshold_ms: i64) -> f64 {
    if latencies_ms.is_empty() {
        return 1.0;
    }

    let tolerating_limit = threshold_ms.saturating_mul(4);
    let satisfied = latencies_ms.iter().filter(|&&l| l <= threshold_ms).count();
    let tolerated = latencies_ms
        .iter()
        .filter(|&&l| l > threshold_ms && l <= tolerating_limit)
        .count();

    let score = (satisfied as f64 + tolerated as f64 / 2.0) / latencies_ms.len() as f64;
    finite_or_zero(score).clamp(0.0, 1.0)
}
