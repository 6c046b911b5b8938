// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! URL discovery instrumentation
//!
//! Wraps a [`Window`](crate::window::Window)'s native capabilities and reports
//! every URL the page touches, once:
//! - XHR opens and fetches
//! - history pushState/replaceState
//! - `src`/`href` assignments on resource elements
//! - URLs in nodes added under the body
//! - anchor clicks and form submissions
//! - URLs embedded in external and inline script bodies

mod attribution;
mod dedup;
mod engine;
mod entry;
pub mod interceptors;
mod matcher;
mod sink;

pub use attribution::{
    parse_stack, FixedAttributor, NoAttributor, SourceAttributor, StackCapture,
    StackTraceAttributor, DEFAULT_IGNORED_FRAMES,
};
pub use dedup::DedupStore;
pub use engine::{HookEngine, HookEngineBuilder, INIT_MESSAGE, UNKNOWN_SOURCE};
pub use entry::{ContextTag, Discovery, LogEntry};
pub use interceptors::{HttpScriptLoader, ScanReport, ScriptLoader, ScriptScanner};
pub use matcher::{UrlMatcher, URL_PATTERN};
pub use sink::{MemorySink, PanelSink, Sink, CONSOLE_PREFIX, PANEL_ID, PANEL_STYLE, PANEL_TITLE};
