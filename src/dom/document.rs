// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Document representation

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use super::element::Element;
use super::mutation::{MutationCallback, MutationObserverOptions, ObserverId};
use super::node::{DomTree, Node, NodeData, NodeId, NodeType};
use super::selector::Selector;
use crate::error::{Error, Result};

/// HTML Document representation
#[derive(Debug, Clone)]
pub struct Document {
    /// Document URL, updated by same-document navigations
    url: Arc<RwLock<Option<Url>>>,
    title: Arc<RwLock<String>>,
    root_id: NodeId,
    pub(crate) tree: Arc<DomTree>,
    document_element_id: Option<NodeId>,
    head_id: Option<NodeId>,
    body_id: Option<NodeId>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        let tree = DomTree::new();
        let root_id = tree.insert(NodeData::document()).id;

        Self {
            url: Arc::new(RwLock::new(None)),
            title: Arc::new(RwLock::new(String::new())),
            root_id,
            tree,
            document_element_id: None,
            head_id: None,
            body_id: None,
        }
    }

    /// Create a document with URL
    pub fn with_url(url: Url) -> Self {
        let doc = Self::new();
        doc.set_url(url);
        doc
    }

    /// Get document URL
    pub fn url(&self) -> Option<Url> {
        self.url.read().clone()
    }

    /// Get document URL as string
    pub fn url_string(&self) -> Option<String> {
        self.url.read().as_ref().map(|u| u.to_string())
    }

    pub fn set_url(&self, url: Url) {
        *self.url.write() = Some(url);
    }

    /// Resolve a possibly relative reference against the document URL
    pub fn resolve_url(&self, reference: &str) -> Result<Url> {
        match self.url.read().as_ref() {
            Some(base) => Ok(base.join(reference)?),
            None => Ok(Url::parse(reference)?),
        }
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    /// Set document title
    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
    }

    /// Get the document element (<html>)
    pub fn document_element(&self) -> Option<Element> {
        self.document_element_id
            .and_then(|id| Element::from_id(id, self.tree.clone()))
    }

    /// Get the <head> element
    pub fn head(&self) -> Option<Element> {
        self.head_id
            .and_then(|id| Element::from_id(id, self.tree.clone()))
    }

    /// Get the <body> element
    pub fn body(&self) -> Option<Element> {
        self.body_id
            .and_then(|id| Element::from_id(id, self.tree.clone()))
    }

    /// Set document element IDs (called during parsing)
    pub(crate) fn set_elements(
        &mut self,
        document_element: Option<NodeId>,
        head: Option<NodeId>,
        body: Option<NodeId>,
    ) {
        self.document_element_id = document_element;
        self.head_id = head;
        self.body_id = body;
    }

    /// Get the root node
    pub fn root(&self) -> Node {
        Node::new(self.root_id, self.tree.clone())
    }

    /// Query selector - find first matching element
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        let sel = Selector::parse(selector).ok()?;
        self.find_matching(&sel, false).into_iter().next()
    }

    /// Query selector all - find all matching elements
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        Selector::parse(selector)
            .map(|sel| self.find_matching(&sel, true))
            .unwrap_or_default()
    }

    fn find_matching(&self, selector: &Selector, find_all: bool) -> Vec<Element> {
        // Ids first, then match without holding the tree lock
        let mut order = Vec::new();
        {
            let nodes = self.tree.nodes.read();
            collect_elements(&nodes, self.root_id, &mut order);
        }

        let mut results = Vec::new();
        for id in order {
            let node = Node::new(id, self.tree.clone());
            if selector.matches(&node) {
                results.extend(Element::new(node));
                if !find_all {
                    break;
                }
            }
        }
        results
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.query_selector(&format!("#{}", id))
    }

    /// Get elements by tag name
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Element> {
        self.query_selector_all(tag)
    }

    /// Create a new detached element
    pub fn create_element(&self, tag: &str) -> Element {
        Element {
            node: self.tree.insert(NodeData::element(tag)),
        }
    }

    /// Create a text node
    pub fn create_text_node(&self, content: &str) -> Node {
        self.tree.insert(NodeData::text(content))
    }

    /// Copy a node, optionally with its subtree, into this document.
    ///
    /// The source may belong to any document. The copy is detached and has no
    /// attribute hooks.
    pub fn import_node(&self, node: &Node, deep: bool) -> Result<Node> {
        let snapshot = {
            let nodes = node.tree().nodes.read();
            let mut out = Vec::new();
            snapshot_subtree(&nodes, node.id, deep, &mut out);
            out
        };
        if snapshot.is_empty() {
            return Err(Error::dom(format!(
                "node {} no longer exists",
                node.id.as_u64()
            )));
        }

        let mapping: HashMap<NodeId, NodeId> =
            snapshot.iter().map(|(old, _)| (*old, NodeId::new())).collect();
        let copy_id = mapping[&node.id];

        {
            let mut nodes = self.tree.nodes.write();
            for (old, mut data) in snapshot {
                data.parent = data.parent.and_then(|p| mapping.get(&p).copied());
                data.children = data
                    .children
                    .iter()
                    .filter_map(|c| mapping.get(c).copied())
                    .collect();
                nodes.insert(mapping[&old], data);
            }
        }

        Ok(Node::new(copy_id, self.tree.clone()))
    }

    /// Register a mutation observer on `target`
    pub fn observe(
        &self,
        target: &Node,
        options: MutationObserverOptions,
        callback: MutationCallback,
    ) -> Result<ObserverId> {
        if !target.same_tree(&self.root()) {
            return Err(Error::dom("observe target belongs to another document"));
        }
        Ok(self.tree.mutations.observe(target.id, options, callback))
    }

    /// Add a target to an existing observer
    pub fn observe_more(
        &self,
        observer: ObserverId,
        target: &Node,
        options: MutationObserverOptions,
    ) -> Result<()> {
        self.tree.mutations.observe_more(observer, target.id, options)
    }

    /// Stop an observer. Pending records are discarded.
    pub fn disconnect(&self, observer: ObserverId) -> bool {
        self.tree.mutations.disconnect(observer)
    }

    /// Deliver pending mutation records to their observers
    pub fn deliver_mutations(&self) -> usize {
        self.tree.mutations.deliver()
    }

    /// Get all links (<a> elements with href)
    pub fn links(&self) -> Vec<Element> {
        self.query_selector_all("a[href]")
    }

    /// Get all forms
    pub fn forms(&self) -> Vec<Element> {
        self.query_selector_all("form")
    }

    /// Get all scripts
    pub fn scripts(&self) -> Vec<Element> {
        self.query_selector_all("script")
    }

    /// Get the document's HTML
    pub fn outer_html(&self) -> String {
        self.root().outer_html()
    }

    /// Get all text content
    pub fn text_content(&self) -> String {
        self.root().text_content()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_elements(nodes: &HashMap<NodeId, NodeData>, id: NodeId, out: &mut Vec<NodeId>) {
    if let Some(data) = nodes.get(&id) {
        if data.node_type == NodeType::Element {
            out.push(id);
        }
        for &child in &data.children {
            collect_elements(nodes, child, out);
        }
    }
}

fn snapshot_subtree(
    nodes: &HashMap<NodeId, NodeData>,
    id: NodeId,
    deep: bool,
    out: &mut Vec<(NodeId, NodeData)>,
) {
    let Some(data) = nodes.get(&id) else {
        return;
    };
    out.push((id, data.clone()));
    if deep {
        for &child in &data.children {
            snapshot_subtree(nodes, child, true, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::mutation::MutationKind;
    use crate::dom::parse_html;
    use parking_lot::Mutex;

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.url().is_none());
        assert!(doc.title().is_empty());
    }

    #[test]
    fn test_create_element() {
        let doc = Document::new();
        let div = doc.create_element("DIV");
        assert_eq!(div.tag_name(), "DIV");
        assert_eq!(div.local_name(), "div");
        assert!(div.parent().is_none());
    }

    #[test]
    fn test_resolve_url() {
        let doc = Document::with_url(Url::parse("https://app.test/dir/page").unwrap());
        assert_eq!(
            doc.resolve_url("next?x=1").unwrap().as_str(),
            "https://app.test/dir/next?x=1"
        );
        assert!(Document::new().resolve_url("/relative").is_err());
    }

    #[test]
    fn test_import_node_deep() {
        let source = parse_html(r#"<div id="a"><img src="https://img.test/x.png"></div>"#).unwrap();
        let target = parse_html("<html><body></body></html>").unwrap();

        let div = source.get_element_by_id("a").unwrap();
        let copy = target.import_node(&div, true).unwrap();
        target.body().unwrap().append_child(&copy);

        let img = target.query_selector("body img").unwrap();
        assert_eq!(img.src().as_deref(), Some("https://img.test/x.png"));
        // Source untouched
        assert_eq!(source.query_selector_all("img").len(), 1);
    }

    #[test]
    fn test_import_node_shallow() {
        let source = parse_html(r#"<div id="a"><span></span></div>"#).unwrap();
        let target = Document::new();
        let copy = target
            .import_node(&source.get_element_by_id("a").unwrap(), false)
            .unwrap();
        assert!(copy.children().is_empty());
        assert_eq!(copy.get_attribute("id").as_deref(), Some("a"));
    }

    #[test]
    fn test_observer_sees_subtree_changes_at_delivery() {
        let doc = parse_html("<html><body><div id='box'></div></body></html>").unwrap();
        let body = doc.body().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(move |records: &[crate::dom::MutationRecord]| {
                sink.lock().extend(records.iter().map(|r| r.kind));
                Ok(())
            }),
        )
        .unwrap();

        let boxed = doc.get_element_by_id("box").unwrap();
        boxed.append_child(&doc.create_element("p"));
        boxed.set_attribute("data-x", "1");
        assert!(seen.lock().is_empty());

        assert_eq!(doc.deliver_mutations(), 2);
        assert_eq!(
            *seen.lock(),
            vec![MutationKind::ChildList, MutationKind::Attributes]
        );
    }

    #[test]
    fn test_observer_error_does_not_stop_delivery() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let body = doc.body().unwrap();
        let count = Arc::new(Mutex::new(0));

        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(|_: &[crate::dom::MutationRecord]| Err(Error::callback("boom"))),
        )
        .unwrap();
        let counter = count.clone();
        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(move |records: &[crate::dom::MutationRecord]| {
                *counter.lock() += records.len();
                Ok(())
            }),
        )
        .unwrap();

        body.append_child(&doc.create_element("div"));
        doc.deliver_mutations();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_observer_panic_does_not_stop_delivery() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let body = doc.body().unwrap();
        let count = Arc::new(Mutex::new(0));

        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(|_: &[crate::dom::MutationRecord]| -> Result<()> {
                panic!("observer failure")
            }),
        )
        .unwrap();
        let counter = count.clone();
        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(move |records: &[crate::dom::MutationRecord]| {
                *counter.lock() += records.len();
                Ok(())
            }),
        )
        .unwrap();

        body.append_child(&doc.create_element("div"));
        assert_eq!(doc.deliver_mutations(), 2);
        assert_eq!(*count.lock(), 1);

        // Both observers stay registered after the panic
        body.set_attribute("data-x", "1");
        assert_eq!(doc.deliver_mutations(), 2);
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_delivery_rounds_are_bounded() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let body = doc.body().unwrap();
        let writer = body.clone();

        // Every delivery writes again, so records never run out
        doc.observe(
            &body,
            MutationObserverOptions::subtree_all(),
            Arc::new(move |_: &[crate::dom::MutationRecord]| {
                writer.set_attribute("data-n", "x");
                Ok(())
            }),
        )
        .unwrap();

        body.set_attribute("data-n", "start");
        let delivered = doc.deliver_mutations();
        assert_eq!(delivered, crate::dom::MAX_DELIVERY_ROUNDS);
    }

    #[test]
    fn test_disconnect() {
        let doc = parse_html("<html><body></body></html>").unwrap();
        let body = doc.body().unwrap();
        let id = doc
            .observe(
                &body,
                MutationObserverOptions::subtree_all(),
                Arc::new(|_: &[crate::dom::MutationRecord]| Ok(())),
            )
            .unwrap();

        body.append_child(&doc.create_element("div"));
        assert!(doc.disconnect(id));
        assert_eq!(doc.deliver_mutations(), 0);
    }
}
