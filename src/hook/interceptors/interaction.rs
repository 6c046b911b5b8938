// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Click and submit listeners on the document

use std::sync::Arc;

use crate::dom::Document;
use crate::error::Result;
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::window::{form_action_url, Event, EventType, Window};

/// Reports the resolved href of the anchor a click lands in
pub struct ClickInterceptor {
    engine: HookEngine,
    document: Document,
}

impl ClickInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let interceptor = ClickInterceptor {
            engine: engine.clone(),
            document: window.document().clone(),
        };
        window.add_event_listener(
            EventType::Click,
            Arc::new(move |event: &Event| interceptor.on_click(event)),
        );
    }

    fn on_click(&self, event: &Event) -> Result<()> {
        let Some(anchor) = event.target().and_then(|t| t.closest("a")) else {
            return Ok(());
        };
        let Some(href) = anchor.href() else {
            return Ok(());
        };

        // An unresolvable href has no URL to report
        let Ok(url) = self.document.resolve_url(&href) else {
            return Ok(());
        };
        let url = url.to_string();
        if self.engine.matcher().is_match(&url) {
            let detail = format!("<a> href: {}", url);
            self.engine
                .report(Discovery::new(url, ContextTag::ClickAnchor, detail));
        }
        Ok(())
    }
}

/// Reports the resolved action of submitted forms
pub struct SubmitInterceptor {
    engine: HookEngine,
    document: Document,
}

impl SubmitInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let interceptor = SubmitInterceptor {
            engine: engine.clone(),
            document: window.document().clone(),
        };
        window.add_event_listener(
            EventType::Submit,
            Arc::new(move |event: &Event| interceptor.on_submit(event)),
        );
    }

    fn on_submit(&self, event: &Event) -> Result<()> {
        let Some(form) = event.target().and_then(|t| t.closest("form")) else {
            return Ok(());
        };
        let Ok(action) = form_action_url(&self.document, &form) else {
            return Ok(());
        };

        let action = action.to_string();
        if self.engine.matcher().is_match(&action) {
            let detail = format!("action: {}", action);
            self.engine
                .report(Discovery::new(action, ContextTag::FormSubmit, detail));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoAttributor;
    use crate::window::WindowConfig;

    fn setup(html: &str) -> (HookEngine, Window) {
        let engine = HookEngine::builder().attributor(NoAttributor).build();
        let window = Window::from_html(html, WindowConfig::new().url("https://a.test/app/")).unwrap();
        ClickInterceptor::install(&engine, &window);
        SubmitInterceptor::install(&engine, &window);
        (engine, window)
    }

    #[test]
    fn test_relative_href_resolved() {
        let (engine, window) = setup(r#"<a id="a" href="../next?x=1">n</a>"#);
        window
            .click(&window.document().get_element_by_id("a").unwrap())
            .unwrap();
        assert_eq!(engine.entries()[0].url, "https://a.test/next?x=1");
    }

    #[test]
    fn test_click_outside_anchor_ignored() {
        let (engine, window) = setup(r#"<p id="p">text</p><a name="x">no href</a>"#);
        window
            .click(&window.document().get_element_by_id("p").unwrap())
            .unwrap();
        assert!(engine.entries().is_empty());
    }

    #[test]
    fn test_empty_action_uses_document_url() {
        let (engine, window) = setup(r#"<form id="f" action=""></form>"#);
        let form = window.document().get_element_by_id("f").unwrap();
        assert!(window.submit(&form).unwrap());
        assert_eq!(engine.entries()[0].detail, "action: https://a.test/app/");
    }
}
