// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Reported URLs and their log entries

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Where a URL was seen
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextTag {
    Xhr,
    Fetch,
    HistoryPushState,
    HistoryReplaceState,
    /// Watched element creation; holds the lowercase tag name
    Element(String),
    ScriptSource,
    InlineScript,
    DomTextNode,
    DomAttribute,
    ClickAnchor,
    FormSubmit,
}

impl std::fmt::Display for ContextTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextTag::Xhr => f.write_str("XHR"),
            ContextTag::Fetch => f.write_str("Fetch"),
            ContextTag::HistoryPushState => f.write_str("History.pushState"),
            ContextTag::HistoryReplaceState => f.write_str("History.replaceState"),
            ContextTag::Element(tag) => write!(f, "Element.{}", tag),
            ContextTag::ScriptSource => f.write_str("ScriptSource"),
            ContextTag::InlineScript => f.write_str("InlineScript"),
            ContextTag::DomTextNode => f.write_str("DOM.TextNode"),
            ContextTag::DomAttribute => f.write_str("DOM.Attribute"),
            ContextTag::ClickAnchor => f.write_str("Click.Anchor"),
            ContextTag::FormSubmit => f.write_str("FormSubmit"),
        }
    }
}

impl Serialize for ContextTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A candidate URL an interceptor wants reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Raw URL text; the dedup key
    pub url: String,
    pub context: ContextTag,
    pub detail: String,
}

impl Discovery {
    pub fn new(url: impl Into<String>, context: ContextTag, detail: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            context,
            detail: detail.into(),
        }
    }
}

/// One line of the log, created the first time a URL is seen
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Discovery order, starting at 1
    pub sequence: u64,
    pub context: ContextTag,
    pub url: String,
    pub detail: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Panel text: `[<context>] <detail> (Source: <origin>)`
    pub fn line(&self) -> String {
        format!("[{}] {} (Source: {})", self.context, self.detail, self.source)
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let entry = LogEntry {
            sequence: 1,
            context: ContextTag::Element("script".into()),
            url: "https://cdn.test/app.js".into(),
            detail: "script src: https://cdn.test/app.js".into(),
            source: "unknown source".into(),
            timestamp: Utc::now(),
        };
        assert_eq!(
            entry.line(),
            "[Element.script] script src: https://cdn.test/app.js (Source: unknown source)"
        );
    }

    #[test]
    fn test_context_serializes_as_label() {
        let json = serde_json::to_string(&ContextTag::HistoryPushState).unwrap();
        assert_eq!(json, "\"History.pushState\"");
    }
}
