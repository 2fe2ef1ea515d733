//! Network metrics aggregation
//!
//! Summary statistics over a set of captured transactions, plus the
//! "enhanced" breakdowns behind the dashboard's tables and charts.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::finite_or_zero;
use crate::models::transaction::TransactionRecord;
use crate::trends::series::build_request_series;
use crate::trends::TimeSeriesPoint;

use super::endpoint::{
    group_by_endpoint, most_used_endpoint, slowest_endpoints, top_endpoints,
    top_slow_endpoint_keys, EndpointGroup, EndpointStats, SlowEndpoint,
};
use super::percentile::{apdex, Percentiles};
use super::Rating;

/// Summary network statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub total_calls: u64,
    /// Responses with a status in [200, 399]
    pub successful_calls: u64,
    pub failed_calls: u64,
    /// Percentage; 0 when there are no calls
    pub success_rate: f64,
    /// Mean duration (ms) over calls that have one
    pub average_speed: f64,
    pub average_request_size: u64,
    pub average_response_size: u64,
    pub percentiles: Percentiles,
    pub most_used_endpoint: Option<String>,
    /// Endpoint keys with the highest p95, highest first
    pub top_slow_endpoints: Vec<String>,
}

/// Per-method share of traffic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodStats {
    pub method: String,
    pub count: u64,
    pub percentage: f64,
    pub average_response_time: f64,
}

/// One bar of the response-time histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimeBucket {
    pub label: String,
    pub min_ms: i64,
    /// Exclusive upper bound; None for the open-ended last bucket
    pub max_ms: Option<i64>,
    pub count: u64,
}

/// Summary plus tables, distributions and the request-rate series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedNetworkMetrics {
    pub summary: NetworkMetrics,
    pub top_endpoints: Vec<EndpointStats>,
    pub slowest_endpoints: Vec<SlowEndpoint>,
    pub method_distribution: Vec<MethodStats>,
    pub status_code_distribution: BTreeMap<u16, u64>,
    pub response_time_distribution: Vec<ResponseTimeBucket>,
    pub request_series: Vec<TimeSeriesPoint>,
    pub apdex: f64,
    /// Percentage of calls without a 2xx response
    pub error_rate: f64,
    pub performance_rating: Rating,
}

fn mean_i64(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().sum();
    Some(finite_or_zero(sum as f64 / values.len() as f64))
}

fn mean_u64_truncated(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<u64>() / values.len() as u64
}

/// Computes network statistics using the thresholds of one [`EngineConfig`]
pub struct NetworkMetricsAnalyzer<'a> {
    config: &'a EngineConfig,
}

impl<'a> NetworkMetricsAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Summary statistics only
    pub fn analyze(&self, records: &[TransactionRecord]) -> NetworkMetrics {
        let groups = group_by_endpoint(records);
        self.summary(records, &groups)
    }

    /// Summary statistics plus every breakdown
    pub fn analyze_enhanced(&self, records: &[TransactionRecord]) -> EnhancedNetworkMetrics {
        let groups = group_by_endpoint(records);
        let summary = self.summary(records, &groups);

        let latencies: Vec<i64> = records.iter().filter_map(|r| r.duration()).collect();
        let apdex = apdex(&latencies, self.config.apdex_threshold_ms);
        let error_rate = error_rate_non_2xx(records);
        let performance_rating = Rating::from_performance(error_rate, apdex, &self.config.apdex_bounds);

        EnhancedNetworkMetrics {
            summary,
            top_endpoints: top_endpoints(&groups, self.config.top_endpoint_limit),
            slowest_endpoints: slowest_endpoints(
                &groups,
                self.config.slow_endpoint_threshold_ms,
                self.config.very_slow_request_ms,
                self.config.slow_endpoint_limit,
            ),
            method_distribution: method_distribution(records),
            status_code_distribution: status_code_distribution(records),
            response_time_distribution: self.response_time_distribution(records),
            request_series: build_request_series(
                records,
                self.config.time_series_bucket_ms,
                self.config.time_series_max_points,
            ),
            apdex,
            error_rate,
            performance_rating,
        }
    }

    fn summary(&self, records: &[TransactionRecord], groups: &[EndpointGroup<'_>]) -> NetworkMetrics {
        let total_calls = records.len() as u64;
        let successful_calls = records.iter().filter(|r| r.is_successful()).count() as u64;
        let failed_calls = total_calls - successful_calls;
        let success_rate = if total_calls > 0 {
            finite_or_zero(successful_calls as f64 / total_calls as f64 * 100.0)
        } else {
            0.0
        };

        let durations: Vec<i64> = records.iter().filter_map(|r| r.duration()).collect();
        let request_sizes: Vec<u64> = records.iter().map(|r| r.request.body_size).collect();
        let response_sizes: Vec<u64> = records
            .iter()
            .filter_map(|r| r.response.as_ref().map(|resp| resp.body_size))
            .collect();

        NetworkMetrics {
            total_calls,
            successful_calls,
            failed_calls,
            success_rate,
            average_speed: mean_i64(&durations).unwrap_or(0.0),
            average_request_size: mean_u64_truncated(&request_sizes),
            average_response_size: mean_u64_truncated(&response_sizes),
            percentiles: Percentiles::from_durations(&durations),
            most_used_endpoint: most_used_endpoint(groups),
            top_slow_endpoints: top_slow_endpoint_keys(groups, self.config.top_slow_limit),
        }
    }

    /// Histogram of durations over the configured bucket bounds
    pub fn response_time_distribution(&self, records: &[TransactionRecord]) -> Vec<ResponseTimeBucket> {
        let b = &self.config.response_time_buckets;
        let bounds: [(i64, Option<i64>); 5] = [
            (i64::MIN, Some(b.fast_ms)),
            (b.fast_ms, Some(b.normal_ms)),
            (b.normal_ms, Some(b.slow_ms)),
            (b.slow_ms, Some(b.very_slow_ms)),
            (b.very_slow_ms, None),
        ];

        let mut counts = [0u64; 5];
        for duration in records.iter().filter_map(|r| r.duration()) {
            let index = bounds
                .iter()
                .position(|&(_, max)| max.map_or(true, |max| duration < max))
                .unwrap_or(bounds.len() - 1);
            counts[index] += 1;
        }

        bounds
            .iter()
            .zip(counts)
            .map(|(&(min, max), count)| {
                let label = match max {
                    Some(max) if min == i64::MIN => format!("<{}ms", max),
                    Some(max) => format!("{}-{}ms", min, max - 1),
                    None => format!(">={}ms", min),
                };
                ResponseTimeBucket {
                    label,
                    min_ms: min.max(0),
                    max_ms: max,
                    count,
                }
            })
            .collect()
    }
}

/// Percentage of calls without a 2xx response; 0 for no calls
pub fn error_rate_non_2xx(records: &[TransactionRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let ok = records.iter().filter(|r| r.is_2xx()).count();
    finite_or_zero((records.len() - ok) as f64 / records.len() as f64 * 100.0)
}

/// Request count, share and mean duration per HTTP method, busiest first
pub fn method_distribution(records: &[TransactionRecord]) -> Vec<MethodStats> {
    let mut by_method: HashMap<String, (u64, Vec<i64>)> = HashMap::new();
    for record in records {
        let entry = by_method
            .entry(record.request.method.to_uppercase())
            .or_insert_with(|| (0, Vec::new()));
        entry.0 += 1;
        if let Some(duration) = record.duration() {
            entry.1.push(duration);
        }
    }

    let total = records.len() as f64;
    let mut stats: Vec<MethodStats> = by_method
        .into_iter()
        .map(|(method, (count, durations))| MethodStats {
            method,
            count,
            percentage: finite_or_zero(count as f64 / total * 100.0),
            average_response_time: mean_i64(&durations).unwrap_or(0.0),
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.method.cmp(&b.method)));
    stats
}

/// Response count per status code, ascending by code
pub fn status_code_distribution(records: &[TransactionRecord]) -> BTreeMap<u16, u64> {
    let mut distribution = BTreeMap::new();
    for code in records.iter().filter_map(|r| r.status_code()) {
        *distribution.entry(code).or_insert(0) += 1;
    }
    distribution
}
