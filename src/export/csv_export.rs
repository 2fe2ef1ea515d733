//! CSV export functionality
//!
//! Provides CSV rendering for the endpoint tables, the method breakdown and
//! the request-rate series.

use std::io::Write;

use chrono::DateTime;
use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::metrics::endpoint::{EndpointStats, SlowEndpoint};
use crate::metrics::network::MethodStats;
use crate::trends::TimeSeriesPoint;
use crate::{EngineError, EngineResult};

/// Flat time-series row; the optional label always gets a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportablePoint {
    pub timestamp: i64,
    /// RFC 3339 rendering of `timestamp`
    pub time: String,
    pub label: String,
    pub value: f64,
}

impl From<&TimeSeriesPoint> for ExportablePoint {
    fn from(point: &TimeSeriesPoint) -> Self {
        Self {
            timestamp: point.timestamp,
            time: DateTime::from_timestamp_millis(point.timestamp)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            label: point.label.clone().unwrap_or_default(),
            value: point.value,
        }
    }
}

/// Serialize rows to `out`; the header comes from the first row
fn write_rows<W: Write, S: Serialize>(rows: impl IntoIterator<Item = S>, out: W) -> EngineResult<()> {
    let mut writer = Writer::from_writer(out);

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| EngineError::Csv(format!("Failed to write CSV record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| EngineError::Csv(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

fn rows_to_string<S: Serialize>(rows: impl IntoIterator<Item = S>) -> EngineResult<String> {
    let mut buf = Vec::new();
    write_rows(rows, &mut buf)?;
    String::from_utf8(buf).map_err(|e| EngineError::Internal(format!("CSV output is not UTF-8: {}", e)))
}

/// Write the top-endpoints table
pub fn write_endpoints_csv<W: Write>(endpoints: &[EndpointStats], out: W) -> EngineResult<()> {
    write_rows(endpoints, out)
}

pub fn endpoints_to_csv(endpoints: &[EndpointStats]) -> EngineResult<String> {
    rows_to_string(endpoints)
}

/// Write the slowest-endpoints table
pub fn write_slow_endpoints_csv<W: Write>(endpoints: &[SlowEndpoint], out: W) -> EngineResult<()> {
    write_rows(endpoints, out)
}

pub fn slow_endpoints_to_csv(endpoints: &[SlowEndpoint]) -> EngineResult<String> {
    rows_to_string(endpoints)
}

pub fn methods_to_csv(methods: &[MethodStats]) -> EngineResult<String> {
    rows_to_string(methods)
}

/// Write a time series, one row per point
pub fn write_time_series_csv<W: Write>(points: &[TimeSeriesPoint], out: W) -> EngineResult<()> {
    write_rows(points.iter().map(ExportablePoint::from), out)
}

pub fn time_series_to_csv(points: &[TimeSeriesPoint]) -> EngineResult<String> {
    rows_to_string(points.iter().map(ExportablePoint::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_endpoint() -> EndpointStats {
        EndpointStats {
            endpoint: "GET /users/{id}".to_string(),
            method: "GET".to_string(),
            path: "/users/{id}".to_string(),
            request_count: 12,
            average_response_time: 182.5,
            error_rate: 8.333,
            total_traffic_bytes: 48_000,
        }
    }

    fn create_test_slow_endpoint() -> SlowEndpoint {
        SlowEndpoint {
            endpoint: "POST /orders".to_string(),
            method: "POST".to_string(),
            path: "/orders".to_string(),
            request_count: 3,
            average_response_time: 1250.0,
            p95_response_time: 1900.0,
            last_slow_request: None,
        }
    }

    #[test]
    fn test_endpoints_to_csv() {
        let content = endpoints_to_csv(&[create_test_endpoint()]).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "endpoint,method,path,request_count,average_response_time,error_rate,total_traffic_bytes"
        );
        assert!(lines[1].starts_with("GET /users/{id},GET,/users/{id},12,182.5,"));
    }

    #[test]
    fn test_slow_endpoints_missing_last_slow_is_empty_cell() {
        let content = slow_endpoints_to_csv(&[create_test_slow_endpoint()]).unwrap();
        assert!(content.contains("last_slow_request"));
        assert!(content.lines().nth(1).unwrap().ends_with("1900.0,"));
    }

    #[test]
    fn test_empty_tables_render_nothing() {
        let content = endpoints_to_csv(&[]).unwrap();
        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        assert!(lines.len() <= 1);
    }

    #[test]
    fn test_time_series_rows_keep_label_column() {
        let points = vec![
            TimeSeriesPoint::new(1_770_287_400_000, 4.0).with_time_label(),
            TimeSeriesPoint::new(1_770_287_460_000, 2.0),
        ];
        let content = time_series_to_csv(&points).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "timestamp,time,label,value");
        assert_eq!(lines[1], "1770287400000,2026-02-05T10:30:00+00:00,10:30,4.0");
        assert_eq!(lines[2], "1770287460000,2026-02-05T10:31:00+00:00,,2.0");
    }

    #[test]
    fn test_write_to_writer() {
        let mut buf = Vec::new();
        write_endpoints_csv(&[create_test_endpoint(), create_test_endpoint()], &mut buf).unwrap();
        let content = String::from_utf8(buf).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_methods_to_csv() {
        let methods = vec![MethodStats {
            method: "GET".to_string(),
            count: 3,
            percentage: 75.0,
            average_response_time: 120.0,
        }];
        let content = methods_to_csv(&methods).unwrap();
        assert!(content.starts_with("method,count,percentage,average_response_time"));
        assert!(content.contains("GET,3,75.0,120.0"));
    }
}
