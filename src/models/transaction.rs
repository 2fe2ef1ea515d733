//! Network transaction types
//!
//! Records produced by the capture layer. All timestamps are UTC epoch
//! milliseconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a captured transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Outgoing request as captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub body_size: u64,
    pub timestamp: i64,
}

impl HttpRequest {
    /// Create a bodiless request
    pub fn new(method: impl Into<String>, url: impl Into<String>, timestamp: i64) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            body_size: 0,
            timestamp,
        }
    }

    /// Attach a body; `body_size` follows the body's byte length
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body_size = body.len() as u64;
        self.body = Some(body);
        self
    }

    /// Set the body size without retaining the body
    pub fn with_body_size(mut self, body_size: u64) -> Self {
        self.body_size = body_size;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Response as captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub body_size: u64,
    pub timestamp: i64,
}

impl HttpResponse {
    pub fn new(status_code: u16, timestamp: i64) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: None,
            body_size: 0,
            timestamp,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body_size = body.len() as u64;
        self.body = Some(body);
        self
    }

    pub fn with_body_size(mut self, body_size: u64) -> Self {
        self.body_size = body_size;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A single captured request/response exchange
///
/// A record is only `Completed` when it carries both a response and an
/// end time. Use [`TransactionRecord::pending`], [`TransactionRecord::complete`]
/// and [`TransactionRecord::fail`] to move between states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
    pub status: TransactionStatus,
    pub start_time: i64,
    pub end_time: Option<i64>,
}

impl TransactionRecord {
    /// Start tracking a request; the start time is the request timestamp
    pub fn pending(id: impl Into<String>, request: HttpRequest) -> Self {
        let start_time = request.timestamp;
        Self {
            id: id.into(),
            request,
            response: None,
            status: TransactionStatus::Pending,
            start_time,
            end_time: None,
        }
    }

    /// Attach the response and finish the exchange
    pub fn complete(mut self, response: HttpResponse, end_time: i64) -> Self {
        self.response = Some(response);
        self.end_time = Some(end_time);
        self.status = TransactionStatus::Completed;
        self
    }

    /// Mark the exchange as failed (connection error, cancellation, ...)
    pub fn fail(mut self, end_time: Option<i64>) -> Self {
        self.end_time = end_time;
        self.status = TransactionStatus::Failed;
        self
    }

    /// Elapsed time in ms, present only when the record has an end time
    pub fn duration(&self) -> Option<i64> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// Response status code, if a response was captured
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status_code)
    }

    /// Response present with a status in [200, 399]
    pub fn is_successful(&self) -> bool {
        matches!(self.status_code(), Some(code) if (200..=399).contains(&code))
    }

    /// Response present with a 2xx status
    pub fn is_2xx(&self) -> bool {
        matches!(self.status_code(), Some(code) if (200..=299).contains(&code))
    }

    /// Request plus response body bytes
    pub fn total_bytes(&self) -> u64 {
        self.request.body_size + self.response.as_ref().map_or(0, |r| r.body_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_has_no_duration() {
        let record = TransactionRecord::pending("1", HttpRequest::new("GET", "/a", 1_000));
        assert_eq!(record.status, TransactionStatus::Pending);
        assert_eq!(record.start_time, 1_000);
        assert!(record.duration().is_none());
        assert!(record.status_code().is_none());
        assert!(!record.is_successful());
    }

    #[test]
    fn test_complete_sets_response_and_end_time() {
        let record = TransactionRecord::pending("1", HttpRequest::new("GET", "/a", 1_000))
            .complete(HttpResponse::new(204, 1_250), 1_250);

        assert_eq!(record.status, TransactionStatus::Completed);
        assert!(record.response.is_some());
        assert_eq!(record.duration(), Some(250));
        assert!(record.is_successful());
        assert!(record.is_2xx());
    }

    #[test]
    fn test_redirect_is_successful_but_not_2xx() {
        let record = TransactionRecord::pending("1", HttpRequest::new("GET", "/a", 0))
            .complete(HttpResponse::new(302, 10), 10);
        assert!(record.is_successful());
        assert!(!record.is_2xx());
    }

    #[test]
    fn test_failed_without_response() {
        let record = TransactionRecord::pending("1", HttpRequest::new("POST", "/a", 0))
            .fail(Some(3_000));
        assert_eq!(record.status, TransactionStatus::Failed);
        assert_eq!(record.duration(), Some(3_000));
        assert!(record.response.is_none());
        assert!(!record.is_successful());
    }

    #[test]
    fn test_total_bytes() {
        let record = TransactionRecord::pending(
            "1",
            HttpRequest::new("POST", "/a", 0).with_body("{\"a\":1}"),
        )
        .complete(HttpResponse::new(200, 5).with_body_size(100), 5);
        assert_eq!(record.total_bytes(), 107);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TransactionStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}
