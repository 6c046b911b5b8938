// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Body subtree observation

use std::sync::Arc;

use crate::dom::{MutationKind, MutationObserverOptions, MutationRecord, Node, NodeId, ObserverId};
use crate::error::{Error, Result};
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::window::Window;

/// Reports URLs in nodes added under the body and in changed attributes.
///
/// Everything inside the panel is skipped, so the panel's own lines never
/// come back as discoveries.
pub struct MutationInterceptor {
    engine: HookEngine,
    panel: NodeId,
}

impl MutationInterceptor {
    /// Observe the window's body. Call after the panel is in place.
    pub fn install(engine: &HookEngine, window: &Window, panel: NodeId) -> Result<ObserverId> {
        let body = window
            .document()
            .body()
            .ok_or_else(|| Error::dom("cannot observe mutations: document has no body"))?;

        let interceptor = Arc::new(MutationInterceptor {
            engine: engine.clone(),
            panel,
        });
        let options = MutationObserverOptions {
            child_list: true,
            attributes: true,
            subtree: true,
            ..Default::default()
        };

        window.observe(
            &body.node,
            options,
            Arc::new(move |records: &[MutationRecord]| {
                interceptor.handle(records);
                Ok(())
            }),
        )
    }

    fn in_panel(&self, node: &Node) -> bool {
        node.is_inclusive_descendant_of(self.panel)
    }

    pub fn handle(&self, records: &[MutationRecord]) {
        for record in records {
            if self.in_panel(&record.target) {
                continue;
            }
            match record.kind {
                MutationKind::ChildList => {
                    for node in record.added_nodes.iter().filter(|n| !self.in_panel(n)) {
                        self.scan_added(node);
                    }
                }
                MutationKind::Attributes => {
                    if let Some(name) = &record.attribute_name {
                        if let Some(value) = record.target.get_attribute(name) {
                            self.report_attribute(name, &value);
                        }
                    }
                }
                MutationKind::CharacterData => {}
            }
        }
    }

    fn scan_added(&self, node: &Node) {
        if node.is_text() {
            self.report_text(&node.text_content());
        } else if node.is_element() {
            for (name, value) in node.sorted_attributes() {
                self.report_attribute(&name, &value);
            }
            // Script bodies belong to the script scanner
            if node.local_name().as_deref() == Some("script") {
                return;
            }
            for child in node.children() {
                self.scan_added(&child);
            }
        }
    }

    fn report_text(&self, text: &str) {
        for url in self.engine.matcher().find_iter(text) {
            self.engine.report(Discovery::new(
                url,
                ContextTag::DomTextNode,
                format!("Text Node URL: {}", url),
            ));
        }
    }

    fn report_attribute(&self, name: &str, value: &str) {
        for url in self.engine.matcher().find_iter(value) {
            self.engine.report(Discovery::new(
                url,
                ContextTag::DomAttribute,
                format!("Attribute URL: {}={}", name, value),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoAttributor;
    use crate::window::WindowConfig;

    #[test]
    fn test_nested_content_of_added_subtree() {
        let engine = HookEngine::builder().attributor(NoAttributor).build();
        let window = Window::new(WindowConfig::new().url("https://a.test/")).unwrap();
        let panel = window.document().create_element("div");
        MutationInterceptor::install(&engine, &window, panel.node.id).unwrap();

        window
            .import_html(
                r#"<body><section data-api="https://api.test/v1">
                    <p>docs at https://docs.test/</p>
                    <script>load("https://skip.test/")</script>
                </section></body>"#,
            )
            .unwrap();

        let urls: Vec<_> = engine.entries().into_iter().map(|e| e.url).collect();
        assert_eq!(urls, vec!["https://api.test/v1", "https://docs.test/"]);
    }

    #[test]
    fn test_srcset_reports_each_url() {
        let engine = HookEngine::builder().attributor(NoAttributor).build();
        let window = Window::new(WindowConfig::new().url("https://a.test/")).unwrap();
        let panel = window.document().create_element("div");
        MutationInterceptor::install(&engine, &window, panel.node.id).unwrap();

        let img = window.document().create_element("img");
        img.set_attribute("srcset", "https://i.test/1.png 1x, https://i.test/2.png 2x");
        window.document().body().unwrap().append_child(&img);
        window.perform_microtask_checkpoint();

        let entries = engine.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[1].detail,
            "Attribute URL: srcset=https://i.test/1.png 1x, https://i.test/2.png 2x"
        );
    }
}
