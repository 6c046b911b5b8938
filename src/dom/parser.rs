// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parser using html5ever

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use url::Url;

use super::document::Document;
use super::node::{NodeData, NodeId};
use crate::error::{Error, Result};

/// Markup of the document a window starts from before content arrives
const BLANK_DOCUMENT: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// Parse HTML string into a Document
pub fn parse_html(html: &str) -> Result<Document> {
    parse_html_with_url(html, None)
}

/// An empty document with head and body, as seen at document start
pub fn blank_document(url: Option<Url>) -> Result<Document> {
    parse_html_with_url(BLANK_DOCUMENT, url)
}

/// Parse HTML string with a base URL
pub fn parse_html_with_url(html: &str, url: Option<Url>) -> Result<Document> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| Error::HtmlParse(e.to_string()))?;

    let mut doc = match url {
        Some(u) => Document::with_url(u),
        None => Document::new(),
    };

    DomConverter { doc: &mut doc }.convert(&dom.document);

    if let Some(title_elem) = doc.query_selector("title") {
        doc.set_title(title_elem.text_content().trim());
    }

    tracing::trace!(url = ?doc.url_string(), "Parsed document");
    Ok(doc)
}

/// Converts html5ever DOM to our DOM
struct DomConverter<'a> {
    doc: &'a mut Document,
}

impl<'a> DomConverter<'a> {
    fn convert(mut self, handle: &Handle) {
        let root_id = self.doc.root().id;

        for child in handle.children.borrow().iter() {
            self.convert_node(child, root_id);
        }

        let html = self.doc.root().element_children().into_iter().next();
        let mut head = None;
        let mut body = None;
        if let Some(html) = &html {
            for child in html.element_children() {
                match child.local_name().as_deref() {
                    Some("head") if head.is_none() => head = Some(child.id),
                    Some("body") if body.is_none() => body = Some(child.id),
                    _ => {}
                }
            }
        }

        self.doc.set_elements(html.map(|h| h.id), head, body);
    }

    fn convert_node(&self, handle: &Handle, parent_id: NodeId) {
        let mut data = match handle.data {
            RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => return,
            RcNodeData::Doctype { .. } => NodeData::doctype(),
            RcNodeData::Text { ref contents } => {
                let text = contents.borrow().to_string();
                // Whitespace-only runs between tags carry nothing; single spaces stay
                if text.trim().is_empty() && text.len() > 1 {
                    return;
                }
                NodeData::text(text)
            }
            RcNodeData::Comment { ref contents } => NodeData::comment(contents.to_string()),
            RcNodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let mut data = NodeData::element(name.local.to_string());
                for attr in attrs.borrow().iter() {
                    data.attributes
                        .insert(attr.name.local.to_string(), attr.value.to_string());
                }
                data
            }
        };

        let node_id = NodeId::new();
        data.parent = Some(parent_id);
        {
            let mut nodes = self.doc.tree.nodes.write();
            nodes.insert(node_id, data);
            if let Some(parent) = nodes.get_mut(&parent_id) {
                parent.children.push(node_id);
            }
        }

        for child in handle.children.borrow().iter() {
            self.convert_node(child, node_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_html() {
        let doc = parse_html("<html><body><p>Hello</p></body></html>").unwrap();
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_blank_document() {
        let url = Url::parse("https://app.test/").unwrap();
        let doc = blank_document(Some(url.clone())).unwrap();

        assert_eq!(doc.url(), Some(url));
        assert!(doc.head().is_some());
        let body = doc.body().unwrap();
        assert!(body.children().is_empty());
    }

    #[test]
    fn test_parse_complex_html() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <title>Test Page</title>
                <script src="https://cdn.test/lib.js"></script>
            </head>
            <body>
                <div id="container">
                    <a href="https://example.com">Link</a>
                    <script>fetch("https://api.test/x")</script>
                </div>
            </body>
            </html>
        "#;
        let doc = parse_html(html).unwrap();

        assert_eq!(doc.title(), "Test Page");
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());

        let scripts = doc.scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].src().as_deref(), Some("https://cdn.test/lib.js"));
        assert!(scripts[1].text_content().contains("https://api.test/x"));

        let links = doc.links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href(), Some("https://example.com".to_string()));
    }
}
