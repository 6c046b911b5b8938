// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Element-specific DOM operations

use std::sync::Arc;

use super::node::{DomTree, Node, NodeId, NodeType};
use super::selector::Selector;

/// Element node with extended operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Inner node reference
    pub node: Node,
}

impl Element {
    /// Create a new element from a node
    pub fn new(node: Node) -> Option<Self> {
        if node.node_type() == NodeType::Element {
            Some(Self { node })
        } else {
            None
        }
    }

    pub(crate) fn from_id(id: NodeId, tree: Arc<DomTree>) -> Option<Self> {
        Self::new(Node::new(id, tree))
    }

    /// Get the tag name (uppercase)
    pub fn tag_name(&self) -> String {
        self.node.tag_name().unwrap_or_default()
    }

    /// Get local name (lowercase)
    pub fn local_name(&self) -> String {
        self.node.local_name().unwrap_or_default()
    }

    /// Get element ID
    pub fn id(&self) -> Option<String> {
        self.node.get_attribute("id")
    }

    /// Get class list as vector
    pub fn class_list(&self) -> Vec<String> {
        self.node
            .get_attribute("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Check if element has a class
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|c| c == class)
    }

    /// Get parent element
    pub fn parent_element(&self) -> Option<Element> {
        self.node.parent().and_then(Element::new)
    }

    /// Get child elements (only element nodes)
    pub fn children(&self) -> Vec<Element> {
        self.node
            .children()
            .into_iter()
            .filter_map(Element::new)
            .collect()
    }

    /// Query selector - first matching descendant
    pub fn query_selector(&self, selector: &str) -> Option<Element> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Query selector all - matching descendants in document order
    pub fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let Ok(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        let mut results = Vec::new();
        for child in self.children() {
            child.collect_matching(&sel, &mut results);
        }
        results
    }

    fn collect_matching(&self, selector: &Selector, results: &mut Vec<Element>) {
        if selector.matches(&self.node) {
            results.push(self.clone());
        }
        for child in self.children() {
            child.collect_matching(selector, results);
        }
    }

    /// Check if element matches a selector
    pub fn matches(&self, selector: &str) -> bool {
        Selector::parse(selector)
            .map(|sel| sel.matches(&self.node))
            .unwrap_or(false)
    }

    /// Closest inclusive ancestor matching selector
    pub fn closest(&self, selector: &str) -> Option<Element> {
        let sel = Selector::parse(selector).ok()?;

        if sel.matches(&self.node) {
            return Some(self.clone());
        }

        self.node
            .ancestors()
            .into_iter()
            .find(|a| sel.matches(a))
            .and_then(Element::new)
    }

    /// Check if this element contains another
    pub fn contains(&self, other: &Node) -> bool {
        other.is_inclusive_descendant_of(self.node.id)
    }

    /// Raw href attribute of links
    pub fn href(&self) -> Option<String> {
        self.get_attribute("href")
    }

    /// Raw src attribute of scripts, images, frames
    pub fn src(&self) -> Option<String> {
        self.get_attribute("src")
    }

    /// Raw action attribute of forms
    pub fn action(&self) -> Option<String> {
        self.get_attribute("action")
    }

    /// Form method, GET unless set
    pub fn method(&self) -> String {
        self.get_attribute("method")
            .map(|m| m.to_uppercase())
            .filter(|m| m == "POST" || m == "DIALOG")
            .unwrap_or_else(|| "GET".to_string())
    }

    /// Get the form this element belongs to
    pub fn form(&self) -> Option<Element> {
        self.closest("form")
    }
}

impl std::ops::Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::parse_html;

    #[test]
    fn test_element_class_list() {
        let doc = parse_html("<div class=\"foo bar baz\">test</div>").unwrap();
        let div = doc.query_selector("div").unwrap();
        let classes = div.class_list();
        assert!(classes.contains(&"foo".to_string()));
        assert!(classes.contains(&"bar".to_string()));
        assert!(classes.contains(&"baz".to_string()));
    }

    #[test]
    fn test_closest_finds_anchor_ancestor() {
        let doc = parse_html(r#"<a href="https://x.test/a"><span><b id="in">hi</b></span></a>"#)
            .unwrap();
        let inner = doc.get_element_by_id("in").unwrap();

        let anchor = inner.closest("a").unwrap();
        assert_eq!(anchor.href().as_deref(), Some("https://x.test/a"));
        assert!(anchor.contains(&inner));
        assert!(inner.closest("form").is_none());
    }

    #[test]
    fn test_form_method() {
        let doc = parse_html(r#"<form method="post"><input id="q"></form><form></form>"#).unwrap();
        let forms = doc.forms();
        assert_eq!(forms[0].method(), "POST");
        assert_eq!(forms[1].method(), "GET");

        let input = doc.get_element_by_id("q").unwrap();
        assert_eq!(input.form(), Some(forms[0].clone()));
    }
}
