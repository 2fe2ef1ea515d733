//! Engine configuration
//!
//! Every breakpoint used by the scoring and bucketing code lives here so it
//! can be tuned (or loaded from JSON) without touching the algorithms.
//! `EngineConfig::default()` reproduces the stock dashboard behaviour.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{EngineError, EngineResult};

/// One step of a step function: values strictly below `below` score `score`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub below: f64,
    pub score: f64,
}

/// Monotonic step function mapping a measurement to a 0-100 score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepScale {
    /// Score for a measurement of exactly zero, checked before the steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_zero: Option<f64>,
    pub steps: Vec<Step>,
    /// Score for values at or beyond the last step
    pub fallback: f64,
}

impl StepScale {
    /// Build a scale from `(below, score)` pairs
    pub fn new(steps: &[(f64, f64)], fallback: f64) -> Self {
        Self {
            exact_zero: None,
            steps: steps
                .iter()
                .map(|&(below, score)| Step { below, score })
                .collect(),
            fallback,
        }
    }

    pub fn with_exact_zero(mut self, score: f64) -> Self {
        self.exact_zero = Some(score);
        self
    }

    /// Score a measurement
    pub fn score(&self, value: f64) -> f64 {
        if let Some(zero) = self.exact_zero {
            if value == 0.0 {
                return zero;
            }
        }
        self.steps
            .iter()
            .find(|step| value < step.below)
            .map(|step| step.score)
            .unwrap_or(self.fallback)
    }

    fn validate(&self, name: &str) -> EngineResult<()> {
        if self.steps.windows(2).any(|w| w[0].below >= w[1].below) {
            return Err(EngineError::Config(format!(
                "{}: step bounds must be strictly increasing",
                name
            )));
        }
        let scores = self
            .steps
            .iter()
            .map(|s| s.score)
            .chain(std::iter::once(self.fallback))
            .chain(self.exact_zero);
        for score in scores {
            if !(0.0..=100.0).contains(&score) {
                return Err(EngineError::Config(format!(
                    "{}: score {} outside [0, 100]",
                    name, score
                )));
            }
        }
        Ok(())
    }
}

/// Weights of the four health sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthWeights {
    pub network_performance: f64,
    pub error_rate: f64,
    pub response_time: f64,
    pub system_resources: f64,
}

impl HealthWeights {
    pub fn total(&self) -> f64 {
        self.network_performance + self.error_rate + self.response_time + self.system_resources
    }
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            network_performance: 0.4,
            error_rate: 0.3,
            response_time: 0.2,
            system_resources: 0.1,
        }
    }
}

/// Lower bounds (inclusive) of the health rating buckets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingBounds {
    pub excellent: f64,
    pub good: f64,
    pub average: f64,
    pub poor: f64,
}

impl Default for RatingBounds {
    fn default() -> Self {
        Self {
            excellent: 90.0,
            good: 75.0,
            average: 60.0,
            poor: 40.0,
        }
    }
}

/// Thresholds turning error rate and Apdex into a performance rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApdexBounds {
    /// Error rate (%) above which the rating is critical regardless of Apdex
    pub critical_error_rate: f64,
    /// Apdex below this is poor
    pub poor: f64,
    /// Apdex below this is average
    pub average: f64,
    /// Apdex below this is good, otherwise excellent
    pub good: f64,
}

impl Default for ApdexBounds {
    fn default() -> Self {
        Self {
            critical_error_rate: 10.0,
            poor: 0.70,
            average: 0.85,
            good: 0.94,
        }
    }
}

/// Upper bounds (exclusive, ms) of the first four response-time buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTimeBuckets {
    pub fast_ms: i64,
    pub normal_ms: i64,
    pub slow_ms: i64,
    pub very_slow_ms: i64,
}

impl Default for ResponseTimeBuckets {
    fn default() -> Self {
        Self {
            fast_ms: 100,
            normal_ms: 500,
            slow_ms: 1000,
            very_slow_ms: 5000,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mean successful duration (ms) -> network performance score
    pub network_performance: StepScale,
    /// Network performance score when no successful request has a duration
    pub network_performance_no_data: f64,
    /// Error rate (%) over completed requests -> error score
    pub error_rate: StepScale,
    /// Mean successful duration (ms) -> response time score
    pub response_time: StepScale,
    /// Preference count -> system resource score
    pub system_resources: StepScale,
    pub weights: HealthWeights,
    pub rating_bounds: RatingBounds,
    pub response_time_buckets: ResponseTimeBuckets,
    /// Apdex target latency T (ms)
    pub apdex_threshold_ms: i64,
    pub apdex_bounds: ApdexBounds,
    /// Endpoints averaging at least this (ms) are listed as slow
    pub slow_endpoint_threshold_ms: f64,
    /// Requests above this (ms) mark an endpoint's last slow request
    pub very_slow_request_ms: i64,
    pub top_endpoint_limit: usize,
    pub slow_endpoint_limit: usize,
    pub top_slow_limit: usize,
    pub time_series_bucket_ms: i64,
    pub time_series_max_points: usize,
    /// Budget for one service refresh, fetch included
    pub refresh_timeout_ms: u64,
    /// How long the service serves a cached snapshot without recomputing
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network_performance: StepScale::new(
                &[(200.0, 100.0), (500.0, 90.0), (1000.0, 75.0), (2000.0, 60.0), (5000.0, 40.0)],
                20.0,
            ),
            network_performance_no_data: 50.0,
            error_rate: StepScale::new(
                &[(1.0, 95.0), (3.0, 85.0), (5.0, 70.0), (10.0, 50.0), (20.0, 30.0)],
                10.0,
            )
            .with_exact_zero(100.0),
            response_time: StepScale::new(
                &[(100.0, 100.0), (300.0, 90.0), (500.0, 80.0), (1000.0, 60.0), (2000.0, 40.0)],
                20.0,
            ),
            system_resources: StepScale::new(
                &[(50.0, 100.0), (100.0, 90.0), (200.0, 80.0), (500.0, 60.0)],
                40.0,
            ),
            weights: HealthWeights::default(),
            rating_bounds: RatingBounds::default(),
            response_time_buckets: ResponseTimeBuckets::default(),
            apdex_threshold_ms: 1000,
            apdex_bounds: ApdexBounds::default(),
            slow_endpoint_threshold_ms: 500.0,
            very_slow_request_ms: 1000,
            top_endpoint_limit: 10,
            slow_endpoint_limit: 10,
            top_slow_limit: 5,
            time_series_bucket_ms: 60_000,
            time_series_max_points: 20,
            refresh_timeout_ms: 5000,
            cache_ttl_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded engine config from {:?}", path.as_ref());
        Self::from_json_str(&contents)
    }

    /// Reject configurations the algorithms cannot work with
    pub fn validate(&self) -> EngineResult<()> {
        self.network_performance.validate("network_performance")?;
        self.error_rate.validate("error_rate")?;
        self.response_time.validate("response_time")?;
        self.system_resources.validate("system_resources")?;

        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(EngineError::Config(format!(
                "health weights must sum to 1.0, got {}",
                self.weights.total()
            )));
        }
        if self.time_series_max_points == 0 {
            return Err(EngineError::Config("time_series_max_points must be > 0".to_string()));
        }
        if self.time_series_bucket_ms <= 0 {
            return Err(EngineError::Config("time_series_bucket_ms must be > 0".to_string()));
        }
        if self.apdex_threshold_ms <= 0 {
            return Err(EngineError::Config("apdex_threshold_ms must be > 0".to_string()));
        }
        let r = &self.rating_bounds;
        if !(r.excellent > r.good && r.good > r.average && r.average > r.poor) {
            return Err(EngineError::Config(
                "rating_bounds must be strictly decreasing from excellent to poor".to_string(),
            ));
        }
        let a = &self.apdex_bounds;
        if !(0.0 <= a.poor && a.poor < a.average && a.average < a.good && a.good <= 1.0) {
            return Err(EngineError::Config(
                "apdex_bounds must satisfy 0 <= poor < average < good <= 1".to_string(),
            ));
        }
        let b = &self.response_time_buckets;
        if !(b.fast_ms < b.normal_ms && b.normal_ms < b.slow_ms && b.slow_ms < b.very_slow_ms) {
            return Err(EngineError::Config(
                "response_time_buckets must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }
}
