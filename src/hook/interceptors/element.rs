// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Element creation interception
//!
//! Elements that can load resources get an attribute hook at creation time,
//! so their `src`/`href` is reported when assigned rather than when the
//! element enters the document.

use std::sync::Arc;

use crate::dom::{AttributeHook, Element, Node};
use crate::error::Result;
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::window::{ElementFactory, Window};

/// Tags whose creation is watched
pub const WATCHED_TAGS: &[&str] = &["script", "iframe", "img", "link", "audio", "video", "source"];

/// Attributes reported on watched elements
pub const WATCHED_ATTRIBUTES: &[&str] = &["src", "href"];

pub struct ElementInterceptor {
    engine: HookEngine,
    original: Arc<dyn ElementFactory>,
}

impl ElementInterceptor {
    pub fn install(engine: &HookEngine, window: &Window) {
        let engine = engine.clone();
        window.element_capability().wrap(move |original| {
            Arc::new(ElementInterceptor { engine, original }) as Arc<dyn ElementFactory>
        });
    }
}

impl ElementFactory for ElementInterceptor {
    fn create_element(&self, tag: &str) -> Result<Element> {
        let element = self.original.create_element(tag)?;

        let tag = tag.to_ascii_lowercase();
        if WATCHED_TAGS.contains(&tag.as_str()) {
            element.set_attribute_hook(Arc::new(SourceAttributeHook {
                engine: self.engine.clone(),
                tag,
            }));
        }
        Ok(element)
    }
}

/// Reports URL-valued `src`/`href` assignments on one element
pub struct SourceAttributeHook {
    engine: HookEngine,
    tag: String,
}

impl AttributeHook for SourceAttributeHook {
    fn on_set_attribute(&self, _element: &Node, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if !WATCHED_ATTRIBUTES.contains(&name.as_str()) || !self.engine.matcher().is_match(value) {
            return;
        }
        self.engine.report(Discovery::new(
            value,
            ContextTag::Element(self.tag.clone()),
            format!("<{}> {}: {}", self.tag, name, value),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoAttributor;
    use crate::window::WindowConfig;

    fn setup() -> (HookEngine, Window) {
        let engine = HookEngine::builder().attributor(NoAttributor).build();
        let window = Window::new(WindowConfig::new().url("https://a.test/")).unwrap();
        ElementInterceptor::install(&engine, &window);
        (engine, window)
    }

    #[test]
    fn test_only_watched_tags_get_hooks() {
        let (_, window) = setup();
        assert!(window.create_element("IFRAME").unwrap().has_attribute_hook());
        assert!(!window.create_element("span").unwrap().has_attribute_hook());
    }

    #[test]
    fn test_relative_src_not_reported() {
        let (engine, window) = setup();
        let img = window.create_element("img").unwrap();
        img.set_attribute("src", "/logo.png");
        img.set_attribute("SRC", "https://cdn.test/logo.png");

        let entries = engine.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].context, ContextTag::Element("img".into()));
    }

    #[test]
    fn test_link_href() {
        let (engine, window) = setup();
        let link = window.create_element("link").unwrap();
        link.set_attribute("href", "https://fonts.test/css");
        assert_eq!(
            engine.lines(),
            vec!["[Element.link] <link> href: https://fonts.test/css (Source: unknown source)"]
        );
    }
}
