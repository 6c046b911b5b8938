// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The instrumentation engine
//!
//! A [`HookEngine`] owns the dedup store, the attributor and the sinks.
//! [`HookEngine::install`] wraps a window's capabilities with interceptors
//! that feed discoveries back into the engine.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use super::attribution::{SourceAttributor, StackTraceAttributor};
use super::dedup::DedupStore;
use super::entry::{Discovery, LogEntry};
use super::interceptors::{
    ClickInterceptor, ElementInterceptor, FetchInterceptor, HistoryInterceptor,
    HttpScriptLoader, MutationInterceptor, ScriptLoader, ScriptScanner, SubmitInterceptor,
    XhrInterceptor,
};
use super::matcher::UrlMatcher;
use super::sink::{PanelSink, Sink};
use crate::error::Result;
use crate::window::Window;

/// Source recorded when attribution finds nothing
pub const UNKNOWN_SOURCE: &str = "unknown source";

/// Console line written once installation completes
pub const INIT_MESSAGE: &str = "URL Hook initialized. Panel at bottom.";

struct EngineInner {
    matcher: UrlMatcher,
    dedup: DedupStore,
    attributor: Box<dyn SourceAttributor>,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    script_loader: Option<Arc<dyn ScriptLoader>>,
    entries: RwLock<Vec<LogEntry>>,
    sequence: AtomicU64,
    installed: AtomicBool,
}

/// URL discovery engine. Clones share state.
#[derive(Clone)]
pub struct HookEngine {
    inner: Arc<EngineInner>,
}

impl HookEngine {
    /// Engine with stack-trace attribution and no extra sinks
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HookEngineBuilder {
        HookEngineBuilder::default()
    }

    pub fn matcher(&self) -> &UrlMatcher {
        &self.inner.matcher
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.inner.dedup
    }

    /// Report a discovery, attributing it to the current call stack.
    ///
    /// Returns false when the URL was already reported.
    pub fn report(&self, discovery: Discovery) -> bool {
        self.report_from(discovery, None)
    }

    /// Report a discovery with a known source. `None` falls back to the
    /// attributor.
    pub fn report_from(&self, discovery: Discovery, source: Option<String>) -> bool {
        if !self.inner.dedup.check_and_insert(&discovery.url) {
            return false;
        }

        let source = source
            .or_else(|| self.attribute())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let entry = LogEntry {
            sequence: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            context: discovery.context,
            url: discovery.url,
            detail: discovery.detail,
            source,
            timestamp: Utc::now(),
        };

        tracing::info!(
            sequence = entry.sequence,
            context = %entry.context,
            url = %entry.url,
            source = %entry.source,
            "URL discovered"
        );

        self.inner.entries.write().push(entry.clone());
        let sinks = self.inner.sinks.read().clone();
        for sink in sinks {
            // A failing sink must not take the page's call down with it
            if panic::catch_unwind(AssertUnwindSafe(|| sink.emit(&entry))).is_err() {
                tracing::error!(url = %entry.url, "Sink panicked while emitting entry");
            }
        }
        true
    }

    fn attribute(&self) -> Option<String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.inner.attributor.attribute())) {
            Ok(source) => source,
            Err(_) => {
                tracing::error!("Source attributor panicked");
                None
            }
        }
    }

    /// Instrument `window`.
    ///
    /// Returns false, changing nothing, if the window is already instrumented
    /// by this or any other engine, or if this engine already instruments a
    /// window. An engine's dedup store and panel belong to one page.
    pub fn install(&self, window: &Window) -> Result<bool> {
        if self
            .inner
            .installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Engine already bound to a window, skipping install");
            return Ok(false);
        }

        match self.instrument(window) {
            Ok(true) => Ok(true),
            other => {
                self.inner.installed.store(false, Ordering::SeqCst);
                other
            }
        }
    }

    fn instrument(&self, window: &Window) -> Result<bool> {
        if window.is_instrumented() {
            tracing::debug!("Window already instrumented, skipping install");
            return Ok(false);
        }

        let panel = PanelSink::attach(window.document(), window.console().clone())?;
        if !window.mark_instrumented() {
            panel.detach();
            return Ok(false);
        }

        let panel_id = panel.panel_id();
        self.inner.sinks.write().insert(0, Arc::new(panel));

        XhrInterceptor::install(self, window);
        FetchInterceptor::install(self, window);
        HistoryInterceptor::install(self, window);
        ElementInterceptor::install(self, window);
        MutationInterceptor::install(self, window, panel_id)?;
        ClickInterceptor::install(self, window);
        SubmitInterceptor::install(self, window);

        let loader = self.inner.script_loader.clone().unwrap_or_else(|| {
            Arc::new(
                HttpScriptLoader::new(window.client().clone())
                    .with_network_log(window.network().clone()),
            )
        });
        ScriptScanner::new(self.clone(), window, loader).schedule(window);

        window.console().log(INIT_MESSAGE);
        tracing::info!(url = ?window.document().url_string(), "URL hook installed");
        Ok(true)
    }

    /// Whether this engine instruments a window
    pub fn is_installed(&self) -> bool {
        self.inner.installed.load(Ordering::SeqCst)
    }

    /// Entries in discovery order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.entries.read().clone()
    }

    /// Panel lines in discovery order
    pub fn lines(&self) -> Vec<String> {
        self.inner.entries.read().iter().map(LogEntry::line).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.inner.entries.read())?)
    }
}

impl Default for HookEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEngine")
            .field("reported", &self.inner.dedup.len())
            .field("installed", &self.is_installed())
            .finish()
    }
}

/// Builder for [`HookEngine`]
#[derive(Default)]
pub struct HookEngineBuilder {
    attributor: Option<Box<dyn SourceAttributor>>,
    sinks: Vec<Arc<dyn Sink>>,
    script_loader: Option<Arc<dyn ScriptLoader>>,
}

impl HookEngineBuilder {
    pub fn attributor(mut self, attributor: impl SourceAttributor + 'static) -> Self {
        self.attributor = Some(Box::new(attributor));
        self
    }

    /// Add a sink alongside the panel
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Loader for external scripts; defaults to the window's HTTP client
    pub fn script_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.script_loader = Some(loader);
        self
    }

    pub fn build(self) -> HookEngine {
        HookEngine {
            inner: Arc::new(EngineInner {
                matcher: UrlMatcher::new(),
                dedup: DedupStore::new(),
                attributor: self
                    .attributor
                    .unwrap_or_else(|| Box::new(StackTraceAttributor::new())),
                sinks: RwLock::new(self.sinks),
                script_loader: self.script_loader,
                entries: RwLock::new(Vec::new()),
                sequence: AtomicU64::new(0),
                installed: AtomicBool::new(false),
            }),
        }
    }
}
