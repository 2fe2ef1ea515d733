//! Request-rate time series
//!
//! Buckets transactions by start time into fixed-width intervals spanning
//! the first to the last start time. When that produces more buckets than
//! the cap, contiguous runs of `ceil(raw / cap)` buckets are merged: counts
//! are summed and the run keeps its first bucket's timestamp.

use crate::models::transaction::TransactionRecord;

use super::TimeSeriesPoint;

/// Number of raw buckets needed to cover `[min_start, max_start]`
pub fn raw_bucket_count(min_start: i64, max_start: i64, bucket_ms: i64) -> usize {
    ((max_start - min_start) / bucket_ms) as usize + 1
}

/// Raw buckets merged into each output point so at most `max_points` remain
pub fn merge_factor(raw_buckets: usize, max_points: usize) -> usize {
    if raw_buckets > max_points {
        raw_buckets.div_ceil(max_points)
    } else {
        1
    }
}

/// Count requests per bucket, downsampled to at most `max_points` points
///
/// Work is proportional to the record count plus the output size, never
/// to the raw span, so a wide time range does not allocate raw buckets.
pub fn build_request_series(
    records: &[TransactionRecord],
    bucket_ms: i64,
    max_points: usize,
) -> Vec<TimeSeriesPoint> {
    let (min_start, max_start) = match (
        records.iter().map(|r| r.start_time).min(),
        records.iter().map(|r| r.start_time).max(),
    ) {
        (Some(min), Some(max)) => (min, max),
        _ => return Vec::new(),
    };
    if bucket_ms <= 0 || max_points == 0 {
        return Vec::new();
    }

    let raw = raw_bucket_count(min_start, max_start, bucket_ms);
    let factor = merge_factor(raw, max_points);
    let point_count = raw.div_ceil(factor);
    let merged_width = bucket_ms * factor as i64;

    let mut counts = vec![0u64; point_count];
    for record in records {
        let raw_index = ((record.start_time - min_start) / bucket_ms) as usize;
        counts[raw_index / factor] += 1;
    }

    tracing::trace!(
        "time series: {} raw buckets, merge factor {}, {} points",
        raw,
        factor,
        point_count
    );

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            TimeSeriesPoint::new(min_start + i as i64 * merged_width, count as f64).with_time_label()
        })
        .collect()
}
