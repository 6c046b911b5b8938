// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! XHR and fetch interception

use std::sync::Arc;

use crate::error::Result;
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::window::{Fetch, FetchFuture, FetchInput, Window, XhrOpen, XmlHttpRequest};

/// Reports every `xhr.open` call, whatever its URL looks like
pub struct XhrInterceptor {
    engine: HookEngine,
    original: Arc<dyn XhrOpen>,
}

impl XhrInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let engine = engine.clone();
        window.xhr_capability().wrap(move |original| {
            Arc::new(XhrInterceptor { engine, original }) as Arc<dyn XhrOpen>
        });
    }
}

impl XhrOpen for XhrInterceptor {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) -> Result<()> {
        self.engine.report(Discovery::new(
            url,
            ContextTag::Xhr,
            format!("{}: {}", method, url),
        ));
        self.original.open(xhr, method, url)
    }
}

/// Reports the URL of every fetch. The request itself is not awaited here.
pub struct FetchInterceptor {
    engine: HookEngine,
    original: Arc<dyn Fetch>,
}

impl FetchInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let engine = engine.clone();
        window.fetch_capability().wrap(move |original| {
            Arc::new(FetchInterceptor { engine, original }) as Arc<dyn Fetch>
        });
    }
}

impl Fetch for FetchInterceptor {
    fn fetch(&self, input: FetchInput) -> FetchFuture {
        let url = input.url();
        if !url.is_empty() {
            let detail = format!("URL: {}", url);
            self.engine
                .report(Discovery::new(url, ContextTag::Fetch, detail));
        }
        self.original.fetch(input)
    }
}
