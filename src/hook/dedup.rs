// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Set of URLs already reported

use dashmap::DashSet;

/// Reported URLs, keyed by raw text. Grows only.
#[derive(Debug, Default)]
pub struct DedupStore {
    seen: DashSet<String>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url`; true if it was not seen before
    pub fn check_and_insert(&self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Sorted copy of every reported URL
    pub fn snapshot(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.seen.iter().map(|u| u.key().clone()).collect();
        urls.sort();
        urls
    }
}
