//! Record builders shared by the module tests

use crate::models::preference::{PreferenceRecord, PreferenceValue, StorageType};
use crate::models::transaction::{HttpRequest, HttpResponse, TransactionRecord};

/// Completed exchange starting at `start` and lasting `duration_ms`
pub fn completed(
    id: &str,
    method: &str,
    url: &str,
    start: i64,
    duration_ms: i64,
    status_code: u16,
) -> TransactionRecord {
    let end = start + duration_ms;
    TransactionRecord::pending(id, HttpRequest::new(method, url, start))
        .complete(HttpResponse::new(status_code, end), end)
}

/// Completed exchange with explicit body sizes
pub fn completed_sized(
    id: &str,
    url: &str,
    start: i64,
    duration_ms: i64,
    request_bytes: u64,
    response_bytes: u64,
) -> TransactionRecord {
    let end = start + duration_ms;
    TransactionRecord::pending(
        id,
        HttpRequest::new("GET", url, start).with_body_size(request_bytes),
    )
    .complete(HttpResponse::new(200, end).with_body_size(response_bytes), end)
}

/// Exchange that failed before a response arrived
pub fn failed(id: &str, url: &str, start: i64, duration_ms: i64) -> TransactionRecord {
    TransactionRecord::pending(id, HttpRequest::new("GET", url, start)).fail(Some(start + duration_ms))
}

/// Exchange still waiting for a response
pub fn pending(id: &str, url: &str, start: i64) -> TransactionRecord {
    TransactionRecord::pending(id, HttpRequest::new("GET", url, start))
}

/// `n` string preferences in shared preferences
pub fn string_prefs(n: usize) -> Vec<PreferenceRecord> {
    (0..n)
        .map(|i| {
            PreferenceRecord::new(
                format!("key_{}", i),
                PreferenceValue::String(format!("value_{}", i)),
                StorageType::SharedPreferences,
            )
        })
        .collect()
}
