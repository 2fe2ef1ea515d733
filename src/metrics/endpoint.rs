//! Endpoint normalization and per-endpoint statistics
//!
//! Requests are grouped under `"<METHOD> <path>"` where the path has its
//! query string dropped and variable segments (numeric IDs, hex tokens,
//! UUIDs) replaced by `{id}`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::finite_or_zero;
use crate::models::transaction::TransactionRecord;

use super::percentile::Percentiles;

/// Placeholder substituted for variable path segments
pub const ID_PLACEHOLDER: &str = "{id}";

/// Minimum length for a hex token to count as an identifier
const MIN_HEX_ID_LEN: usize = 8;

/// True for segments that identify a resource instance rather than a route
pub fn is_id_segment(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    // Hex / UUID tokens. All-letter words such as "cafebabe" stay routes.
    segment.len() >= MIN_HEX_ID_LEN
        && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
        && segment.chars().any(|c| c.is_ascii_digit())
}

/// Path component of a URL (absolute or relative), without query or fragment
fn path_of(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or("");
    match without_query.find("://") {
        Some(scheme_end) => {
            let after_scheme = &without_query[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(path_start) => &after_scheme[path_start..],
                None => "",
            }
        }
        None => without_query,
    }
}

/// Normalize a request URL to its grouping path
pub fn normalize_path(url: &str) -> String {
    let path = path_of(url);

    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            if is_id_segment(&decoded) {
                ID_PLACEHOLDER.to_string()
            } else {
                decoded
            }
        })
        .collect();

    let joined = segments.join("/");
    let trimmed = joined.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Group key for a method and URL
pub fn endpoint_key(method: &str, url: &str) -> String {
    format!("{} {}", method.to_uppercase(), normalize_path(url))
}

/// Requests sharing one normalized endpoint, in first-seen order
#[derive(Debug, Clone)]
pub struct EndpointGroup<'a> {
    pub key: String,
    pub method: String,
    pub path: String,
    pub records: Vec<&'a TransactionRecord>,
}

impl<'a> EndpointGroup<'a> {
    pub fn request_count(&self) -> usize {
        self.records.len()
    }

    /// Durations of records that have one
    pub fn durations(&self) -> Vec<i64> {
        self.records.iter().filter_map(|r| r.duration()).collect()
    }

    /// Mean duration over records with a duration, None if there are none
    pub fn average_duration(&self) -> Option<f64> {
        let durations = self.durations();
        if durations.is_empty() {
            return None;
        }
        let sum: i64 = durations.iter().sum();
        Some(finite_or_zero(sum as f64 / durations.len() as f64))
    }

    pub fn percentiles(&self) -> Percentiles {
        Percentiles::from_durations(&self.durations())
    }

    /// Percentage of requests without a 2xx response
    pub fn error_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let errors = self.records.iter().filter(|r| !r.is_2xx()).count();
        finite_or_zero(errors as f64 / self.records.len() as f64 * 100.0)
    }

    /// Request plus response body bytes across the group
    pub fn total_traffic(&self) -> u64 {
        self.records.iter().map(|r| r.total_bytes()).sum()
    }

    /// Start time of the latest request slower than `threshold_ms`
    pub fn last_request_slower_than(&self, threshold_ms: i64) -> Option<i64> {
        self.records
            .iter()
            .filter(|r| r.duration().is_some_and(|d| d > threshold_ms))
            .map(|r| r.start_time)
            .max()
    }
}

/// Group records by endpoint key, keeping first-seen order
pub fn group_by_endpoint(records: &[TransactionRecord]) -> Vec<EndpointGroup<'_>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<EndpointGroup<'_>> = Vec::new();

    for record in records {
        let method = record.request.method.to_uppercase();
        let path = normalize_path(&record.request.url);
        let key = format!("{} {}", method, path);

        match index.get(&key) {
            Some(&i) => groups[i].records.push(record),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(EndpointGroup {
                    key,
                    method,
                    path,
                    records: vec![record],
                });
            }
        }
    }

    groups
}

/// Row of the top-endpoints table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub request_count: u64,
    pub average_response_time: f64,
    pub error_rate: f64,
    pub total_traffic_bytes: u64,
}

impl From<&EndpointGroup<'_>> for EndpointStats {
    fn from(group: &EndpointGroup<'_>) -> Self {
        Self {
            endpoint: group.key.clone(),
            method: group.method.clone(),
            path: group.path.clone(),
            request_count: group.request_count() as u64,
            average_response_time: group.average_duration().unwrap_or(0.0),
            error_rate: group.error_rate(),
            total_traffic_bytes: group.total_traffic(),
        }
    }
}

/// Row of the slowest-endpoints table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowEndpoint {
    pub endpoint: String,
    pub method: String,
    pub path: String,
    pub request_count: u64,
    pub average_response_time: f64,
    pub p95_response_time: f64,
    /// Start time (epoch ms) of the latest request over the very-slow threshold
    pub last_slow_request: Option<i64>,
}

/// Top `limit` endpoints by request count; ties keep first-seen order
pub fn top_endpoints(groups: &[EndpointGroup<'_>], limit: usize) -> Vec<EndpointStats> {
    let mut ranked: Vec<&EndpointGroup<'_>> = groups.iter().collect();
    ranked.sort_by(|a, b| b.request_count().cmp(&a.request_count()));
    ranked.into_iter().take(limit).map(EndpointStats::from).collect()
}

/// Most requested endpoint key
pub fn most_used_endpoint(groups: &[EndpointGroup<'_>]) -> Option<String> {
    top_endpoints(groups, 1).into_iter().next().map(|e| e.endpoint)
}

/// Endpoints averaging at least `threshold_ms`, slowest first
pub fn slowest_endpoints(
    groups: &[EndpointGroup<'_>],
    threshold_ms: f64,
    very_slow_ms: i64,
    limit: usize,
) -> Vec<SlowEndpoint> {
    let mut slow: Vec<SlowEndpoint> = groups
        .iter()
        .filter_map(|group| {
            let average = group.average_duration()?;
            if average < threshold_ms {
                return None;
            }
            Some(SlowEndpoint {
                endpoint: group.key.clone(),
                method: group.method.clone(),
                path: group.path.clone(),
                request_count: group.request_count() as u64,
                average_response_time: average,
                p95_response_time: group.percentiles().p95,
                last_slow_request: group.last_request_slower_than(very_slow_ms),
            })
        })
        .collect();

    slow.sort_by(|a, b| b.average_response_time.total_cmp(&a.average_response_time));
    slow.truncate(limit);
    slow
}

/// Keys of the `limit` endpoints with the highest p95, highest first
pub fn top_slow_endpoint_keys(groups: &[EndpointGroup<'_>], limit: usize) -> Vec<String> {
    let mut by_p95: Vec<(String, f64)> = groups
        .iter()
        .filter(|g| g.records.iter().any(|r| r.duration().is_some()))
        .map(|g| (g.key.clone(), g.percentiles().p95))
        .collect();
    by_p95.sort_by(|a, b| b.1.total_cmp(&a.1));
    by_p95.into_iter().take(limit).map(|(key, _)| key).collect()
}
