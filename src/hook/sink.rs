// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Output sinks for log entries

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::entry::LogEntry;
use crate::dom::{Document, NodeId, WeakNode};
use crate::error::{Error, Result};
use crate::window::Console;

/// Element id of the in-page panel
pub const PANEL_ID: &str = "urlhook-panel";

/// Inline style of the panel: pinned to the bottom of the viewport
pub const PANEL_STYLE: &str = "position: fixed; bottom: 0; left: 0; width: 100%; \
     max-height: 250px; overflow-y: auto; background-color: rgba(0,0,0,0.85); \
     color: lime; font-family: monospace; font-size: 12px; z-index: 9999999999; \
     padding: 5px 10px; border-top: 3px solid lime;";

/// Header text of the panel
pub const PANEL_TITLE: &str = "URL Hook Panel";

/// Console prefix for mirrored lines
pub const CONSOLE_PREFIX: &str = "[URL Hook]";

/// Rendered height of one panel line, in CSS pixels
const LINE_HEIGHT_PX: usize = 15;

/// Receives each new log entry
pub trait Sink: Send + Sync {
    fn emit(&self, entry: &LogEntry);
}

/// Visible panel appended to the document body, mirrored to the console
pub struct PanelSink {
    panel: WeakNode,
    console: Console,
    lines: RwLock<Vec<String>>,
    scroll_top: AtomicUsize,
}

impl PanelSink {
    /// Build the panel and append it to `document`'s body
    pub fn attach(document: &Document, console: Console) -> Result<Self> {
        let body = document
            .body()
            .ok_or_else(|| Error::dom("cannot attach panel: document has no body"))?;

        let panel = document.create_element("div");
        panel.set_attribute("id", PANEL_ID);
        panel.set_attribute("style", PANEL_STYLE);

        let header = document.create_element("strong");
        header.append_child(&document.create_text_node(PANEL_TITLE));
        panel.append_child(&header);
        panel.append_child(&document.create_element("br"));

        body.append_child(&panel);
        tracing::debug!(panel = panel.node.id.as_u64(), "Panel attached");

        Ok(Self {
            panel: panel.node.downgrade(),
            console,
            lines: RwLock::new(Vec::new()),
            scroll_top: AtomicUsize::new(0),
        })
    }

    /// Node id of the panel element
    pub fn panel_id(&self) -> NodeId {
        self.panel.id()
    }

    /// Take this panel, and only this panel, out of the document
    pub fn detach(&self) {
        if let Some(panel) = self.panel.upgrade() {
            if let Some(parent) = panel.parent() {
                parent.remove_child(&panel);
                tracing::debug!(panel = panel.id.as_u64(), "Panel detached");
            }
        }
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.read().clone()
    }

    /// Total content height of the panel
    pub fn scroll_height(&self) -> usize {
        self.panel
            .upgrade()
            .map(|panel| panel.element_children().len() * LINE_HEIGHT_PX)
            .unwrap_or(0)
    }

    /// Current scroll offset; follows the newest line
    pub fn scroll_top(&self) -> usize {
        self.scroll_top.load(Ordering::Relaxed)
    }
}

impl Sink for PanelSink {
    fn emit(&self, entry: &LogEntry) {
        let line = entry.line();

        if let Some(panel) = self.panel.upgrade() {
            let row = panel.create_element("div");
            row.append_child(&panel.create_text_node(&line));
            panel.append_child(&row);
            self.scroll_top
                .store(self.scroll_height(), Ordering::Relaxed);
        }

        self.console.log(format!("{} {}", CONSOLE_PREFIX, line));
        self.lines.write().push(line);
    }
}

impl std::fmt::Debug for PanelSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelSink")
            .field("panel", &self.panel.id())
            .field("lines", &self.lines.read().len())
            .finish()
    }
}

/// Keeps entries in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RwLock<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.read().iter().map(LogEntry::line).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        self.entries.write().push(entry.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::hook::ContextTag;
    use crate::window::ConsoleLevel;
    use chrono::Utc;

    fn entry(n: u64, url: &str) -> LogEntry {
        LogEntry {
            sequence: n,
            context: ContextTag::Fetch,
            url: url.to_string(),
            detail: format!("URL: {}", url),
            source: "unknown source".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_panel_structure() {
        let doc = parse_html("<html><body><p>page</p></body></html>").unwrap();
        let sink = PanelSink::attach(&doc, Console::new()).unwrap();

        let panel = doc.get_element_by_id(PANEL_ID).unwrap();
        assert_eq!(panel.node.id, sink.panel_id());
        assert_eq!(panel.parent_element(), doc.body());
        assert_eq!(panel.get_attribute("style").as_deref(), Some(PANEL_STYLE));
        assert!(panel.inner_html().starts_with("<strong>URL Hook Panel</strong><br>"));
    }

    #[test]
    fn test_emit_appends_and_mirrors() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let console = Console::new();
        let sink = PanelSink::attach(&doc, console.clone()).unwrap();

        sink.emit(&entry(1, "https://a.test/"));
        sink.emit(&entry(2, "https://b.test/"));

        let panel = doc.get_element_by_id(PANEL_ID).unwrap();
        let rows = panel.query_selector_all("div");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].text_content(),
            "[Fetch] URL: https://b.test/ (Source: unknown source)"
        );
        assert_eq!(sink.scroll_top(), sink.scroll_height());
        assert_eq!(
            console.lines(ConsoleLevel::Log)[0],
            "[URL Hook] [Fetch] URL: https://a.test/ (Source: unknown source)"
        );
    }

    #[test]
    fn test_detach_removes_only_own_panel() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let first = PanelSink::attach(&doc, Console::new()).unwrap();
        let second = PanelSink::attach(&doc, Console::new()).unwrap();
        assert_eq!(doc.query_selector_all("#urlhook-panel").len(), 2);

        second.detach();

        let panels = doc.query_selector_all("#urlhook-panel");
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].node.id, first.panel_id());

        first.emit(&entry(1, "https://a.test/"));
        assert_eq!(panels[0].query_selector_all("div").len(), 1);
    }

    #[test]
    fn test_attach_requires_body() {
        let doc = Document::new();
        assert!(PanelSink::attach(&doc, Console::new()).is_err());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.emit(&entry(1, "https://a.test/"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.entries()[0].url, "https://a.test/");
    }
}
