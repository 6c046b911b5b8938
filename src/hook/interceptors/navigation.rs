// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! History API interception

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::window::{History, Window};

/// Reports the URL argument of `pushState` and `replaceState`
pub struct HistoryInterceptor {
    engine: HookEngine,
    original: Arc<dyn History>,
}

impl HistoryInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let engine = engine.clone();
        window.history_capability().wrap(move |original| {
            Arc::new(HistoryInterceptor { engine, original }) as Arc<dyn History>
        });
    }

    fn observe(&self, url: Option<&str>, context: ContextTag, verb: &str) {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.engine
                .report(Discovery::new(url, context, format!("{}: {}", verb, url)));
        }
    }
}

impl History for HistoryInterceptor {
    fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.observe(url, ContextTag::HistoryPushState, "pushState");
        self.original.push_state(state, title, url)
    }

    fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.observe(url, ContextTag::HistoryReplaceState, "replaceState");
        self.original.replace_state(state, title, url)
    }
}
