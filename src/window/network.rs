// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Record of network activity performed by a window's native capabilities

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// What initiated a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// Top-level navigation (link click, form submission, page load)
    Navigation,
    Xhr,
    Fetch,
    /// External script source load
    Script,
}

/// How a request ended, as far as the window knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Issued but not fetched by the window (navigations leave the page)
    Pending,
    Completed { status: u16, duration_ms: u64 },
    Failed(String),
}

/// One request as seen by the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: u64,
    pub kind: RequestKind,
    pub method: String,
    pub url: String,
    /// Response status, if a response arrived
    pub status: Option<u16>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<u64>,
}

impl NetworkRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s))
    }
}

#[derive(Debug)]
struct Inner {
    records: RwLock<Vec<NetworkRecord>>,
    next_id: AtomicU64,
    max_records: usize,
}

/// Shared, bounded network log
#[derive(Debug, Clone)]
pub struct NetworkLog {
    inner: Arc<Inner>,
}

impl NetworkLog {
    pub fn new(max_records: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                max_records,
            }),
        }
    }

    /// Record a request outcome. Oldest records go first once the cap is hit.
    pub fn record(
        &self,
        kind: RequestKind,
        method: impl Into<String>,
        url: impl Into<String>,
        outcome: RequestOutcome,
    ) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (status, duration_ms, error) = match outcome {
            RequestOutcome::Pending => (None, None, None),
            RequestOutcome::Completed {
                status,
                duration_ms,
            } => (Some(status), Some(duration_ms), None),
            RequestOutcome::Failed(e) => (None, None, Some(e)),
        };

        let record = NetworkRecord {
            id,
            kind,
            method: method.into(),
            url: url.into(),
            status,
            error,
            timestamp: Utc::now(),
            duration_ms,
        };

        let mut records = self.inner.records.write();
        if self.inner.max_records > 0 && records.len() >= self.inner.max_records {
            records.remove(0);
        }
        records.push(record);
        id
    }

    /// Get all records
    pub fn records(&self) -> Vec<NetworkRecord> {
        self.inner.records.read().clone()
    }

    /// Get records of one kind
    pub fn records_by_kind(&self, kind: RequestKind) -> Vec<NetworkRecord> {
        self.inner
            .records
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// Get unique URLs requested
    pub fn unique_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .inner
            .records
            .read()
            .iter()
            .map(|r| r.url.clone())
            .collect();
        urls.sort();
        urls.dedup();
        urls
    }

    pub fn len(&self) -> usize {
        self.inner.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.inner.records.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(status: u16) -> RequestOutcome {
        RequestOutcome::Completed {
            status,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_record_and_query() {
        let log = NetworkLog::new(10);
        log.record(RequestKind::Fetch, "GET", "https://a.test/", done(200));
        log.record(
            RequestKind::Xhr,
            "POST",
            "https://b.test/",
            RequestOutcome::Failed("refused".into()),
        );
        log.record(RequestKind::Fetch, "GET", "https://a.test/", done(404));

        assert_eq!(log.len(), 3);
        assert_eq!(log.records_by_kind(RequestKind::Fetch).len(), 2);
        assert_eq!(log.unique_urls().len(), 2);
        assert!(log.records()[0].is_success());
        assert!(!log.records()[2].is_success());
        assert_eq!(log.records()[1].error.as_deref(), Some("refused"));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let log = NetworkLog::new(2);
        for i in 0..3 {
            log.record(RequestKind::Script, "GET", format!("https://s.test/{}", i), done(200));
        }
        let urls: Vec<_> = log.records().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://s.test/1", "https://s.test/2"]);
    }
}
