// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # urlhook - URL exfiltration visibility for headless pages
//!
//! Instruments a headless window and reports every URL the page touches,
//! once, to an in-page panel and the console. Intended for auditing what
//! third-party scripts talk to.
//!
//! ## Features
//!
//! - Network: XHR `open` and `fetch`
//! - Navigation: `history.pushState` / `replaceState`
//! - Elements: `src`/`href` on script, iframe, img, link, audio, video, source
//! - DOM: URLs in nodes and attributes added under the body
//! - Interaction: anchor clicks, form submissions
//! - Scripts: URLs embedded in external and inline script bodies
//!
//! Every intercepted call still runs unchanged.
//!
//! ## Example
//!
//! ```rust,no_run
//! use urlhook::{HookEngine, Window, WindowConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let window = Window::new(WindowConfig::new().url("https://example.com"))?;
//!     let engine = HookEngine::new();
//!     engine.install(&window)?;
//!
//!     window.load().await?;
//!     window.run_until_idle().await;
//!
//!     for line in engine.lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod dom;
pub mod error;
pub mod hook;
pub mod http;
pub mod window;

// Re-exports for convenience

// Window
pub use window::{
    Console, ConsoleLevel, ConsoleMessage, Event, EventType, FetchInput, NetworkLog,
    NetworkRecord, ReadyState, RequestKind, Slot, Window, WindowConfig, XmlHttpRequest,
};

// Engine
pub use hook::{HookEngine, HookEngineBuilder, ScanReport, UNKNOWN_SOURCE};
pub use hook::{ContextTag, Discovery, LogEntry};
pub use hook::{DedupStore, UrlMatcher};
pub use hook::{MemorySink, PanelSink, Sink};
pub use hook::{FixedAttributor, NoAttributor, SourceAttributor, StackTraceAttributor};
pub use hook::{HttpScriptLoader, ScriptLoader};

// DOM
pub use dom::{Document, Element, MutationObserverOptions, MutationRecord, Node};

// Errors
pub use error::{Error, ErrorContext, Result};

// HTTP
pub use http::{HttpClient, HttpClientConfig, Request, Response};

/// urlhook version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_attributes_to_calling_code() {
        let window = Window::from_html(
            "<html><body></body></html>",
            WindowConfig::new().url("https://page.test/"),
        )
        .unwrap();
        let engine = HookEngine::new();
        engine.install(&window).unwrap();

        let xhr = XmlHttpRequest::new();
        window.xhr_open(&xhr, "GET", "https://api.test/attributed").unwrap();

        let entries = engine.entries();
        assert_eq!(entries.len(), 1);
        assert!(
            entries[0].source.contains("lib.rs:"),
            "attributed to {}",
            entries[0].source
        );
    }
}
