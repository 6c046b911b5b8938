// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM Node types

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::mutation::{MutationRecord, MutationRegistry};

/// Unique node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new unique node ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    DocumentType,
    DocumentFragment,
}

/// Internal node data
#[derive(Debug, Clone)]
pub struct NodeData {
    pub node_type: NodeType,
    /// Lowercase tag name (for elements)
    pub tag_name: Option<String>,
    /// Data of text and comment nodes
    pub text_content: Option<String>,
    pub attributes: HashMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    fn with_type(node_type: NodeType) -> Self {
        Self {
            node_type,
            tag_name: None,
            text_content: None,
            attributes: HashMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a new element node data
    pub fn element(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: Some(tag_name.into().to_lowercase()),
            ..Self::with_type(NodeType::Element)
        }
    }

    /// Create a new text node data
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text_content: Some(content.into()),
            ..Self::with_type(NodeType::Text)
        }
    }

    /// Create a new comment node data
    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            text_content: Some(content.into()),
            ..Self::with_type(NodeType::Comment)
        }
    }

    pub fn doctype() -> Self {
        Self::with_type(NodeType::DocumentType)
    }

    /// Create a new document node data
    pub fn document() -> Self {
        Self::with_type(NodeType::Document)
    }
}

/// Observer of attribute writes on one element.
///
/// Runs before the value is stored. The write always happens afterwards,
/// whatever the hook does.
pub trait AttributeHook: Send + Sync {
    fn on_set_attribute(&self, element: &Node, name: &str, value: &str);
}

/// Storage shared by every node of one document
#[derive(Default)]
pub struct DomTree {
    pub(crate) nodes: RwLock<HashMap<NodeId, NodeData>>,
    hooks: RwLock<HashMap<NodeId, Arc<dyn AttributeHook>>>,
    pub(crate) mutations: MutationRegistry,
}

impl DomTree {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn insert(self: &Arc<Self>, data: NodeData) -> Node {
        let id = NodeId::new();
        self.nodes.write().insert(id, data);
        Node::new(id, self.clone())
    }

    fn strict_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        let mut out = Vec::new();
        let mut current = nodes.get(&id).and_then(|n| n.parent);
        while let Some(pid) = current {
            out.push(pid);
            current = nodes.get(&pid).and_then(|n| n.parent);
        }
        out
    }
}

impl std::fmt::Debug for DomTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomTree")
            .field("nodes", &self.nodes.read().len())
            .field("hooks", &self.hooks.read().len())
            .field("mutations", &self.mutations)
            .finish()
    }
}

/// A reference to a node in the DOM tree
#[derive(Clone)]
pub struct Node {
    pub id: NodeId,
    tree: Arc<DomTree>,
}

/// Non-owning node handle, for holders that live inside the tree's own callbacks
#[derive(Debug, Clone)]
pub struct WeakNode {
    id: NodeId,
    tree: Weak<DomTree>,
}

impl WeakNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Node> {
        self.tree.upgrade().map(|tree| Node::new(self.id, tree))
    }
}

impl Node {
    pub(crate) fn new(id: NodeId, tree: Arc<DomTree>) -> Self {
        Self { id, tree }
    }

    pub(crate) fn tree(&self) -> &Arc<DomTree> {
        &self.tree
    }

    /// New detached element in this node's document
    pub(crate) fn create_element(&self, tag: &str) -> Node {
        self.tree.insert(NodeData::element(tag))
    }

    /// New detached text node in this node's document
    pub(crate) fn create_text_node(&self, content: &str) -> Node {
        self.tree.insert(NodeData::text(content))
    }

    fn with_data<R>(&self, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.tree.nodes.read().get(&self.id).map(f)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            id: self.id,
            tree: Arc::downgrade(&self.tree),
        }
    }

    /// Whether both handles point into the same document
    pub fn same_tree(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }

    /// Get the node type
    pub fn node_type(&self) -> NodeType {
        self.with_data(|n| n.node_type).unwrap_or(NodeType::Element)
    }

    /// Get the tag name (uppercase, like browsers)
    pub fn tag_name(&self) -> Option<String> {
        self.local_name().map(|t| t.to_uppercase())
    }

    /// Get the tag name in lowercase
    pub fn local_name(&self) -> Option<String> {
        self.with_data(|n| n.tag_name.clone()).flatten()
    }

    /// Get text content
    pub fn text_content(&self) -> String {
        let nodes = self.tree.nodes.read();
        collect_text(&nodes, self.id)
    }

    /// Set text content. Elements get their children replaced by one text node.
    pub fn set_text_content(&self, content: impl Into<String>) {
        let content = content.into();

        let record = {
            let mut nodes = self.tree.nodes.write();
            let Some(node) = nodes.get_mut(&self.id) else {
                return;
            };

            match node.node_type {
                NodeType::Text | NodeType::Comment => {
                    let old = node.text_content.replace(content);
                    MutationRecord::character_data(self.clone(), old)
                }
                _ => {
                    let removed = std::mem::take(&mut node.children);
                    let text_id = NodeId::new();
                    let added = if content.is_empty() {
                        Vec::new()
                    } else {
                        node.children.push(text_id);
                        vec![Node::new(text_id, self.tree.clone())]
                    };
                    for id in &removed {
                        if let Some(child) = nodes.get_mut(id) {
                            child.parent = None;
                        }
                    }
                    if !added.is_empty() {
                        let mut text = NodeData::text(content);
                        text.parent = Some(self.id);
                        nodes.insert(text_id, text);
                    }
                    let removed = removed
                        .into_iter()
                        .map(|id| Node::new(id, self.tree.clone()))
                        .collect();
                    MutationRecord::child_list(self.clone(), added, removed)
                }
            }
        };

        self.notify(record);
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.with_data(|n| n.attributes.get(&name.to_lowercase()).cloned())
            .flatten()
    }

    /// Set an attribute value.
    ///
    /// An installed [`AttributeHook`] sees the write first.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();

        let hook = self.tree.hooks.read().get(&self.id).cloned();
        if let Some(hook) = hook {
            let observed = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                hook.on_set_attribute(self, &name, &value)
            }));
            if observed.is_err() {
                tracing::error!(attribute = %name, "Attribute hook panicked");
            }
        }

        let old = {
            let mut nodes = self.tree.nodes.write();
            match nodes.get_mut(&self.id) {
                Some(node) if node.node_type == NodeType::Element => {
                    node.attributes.insert(name.clone(), value)
                }
                _ => return,
            }
        };

        self.notify(MutationRecord::attributes(self.clone(), name, old));
    }

    /// Remove an attribute
    pub fn remove_attribute(&self, name: &str) {
        let name = name.to_lowercase();
        let old = self
            .tree
            .nodes
            .write()
            .get_mut(&self.id)
            .and_then(|n| n.attributes.remove(&name));

        if old.is_some() {
            self.notify(MutationRecord::attributes(self.clone(), name, old));
        }
    }

    /// Check if has an attribute
    pub fn has_attribute(&self, name: &str) -> bool {
        self.with_data(|n| n.attributes.contains_key(&name.to_lowercase()))
            .unwrap_or(false)
    }

    /// Get all attributes
    pub fn attributes(&self) -> HashMap<String, String> {
        self.with_data(|n| n.attributes.clone()).unwrap_or_default()
    }

    /// Attributes ordered by name
    pub fn sorted_attributes(&self) -> Vec<(String, String)> {
        let mut attrs: Vec<_> = self.attributes().into_iter().collect();
        attrs.sort();
        attrs
    }

    /// Install the attribute hook for this node, replacing any previous one
    pub fn set_attribute_hook(&self, hook: Arc<dyn AttributeHook>) {
        self.tree.hooks.write().insert(self.id, hook);
    }

    pub fn has_attribute_hook(&self) -> bool {
        self.tree.hooks.read().contains_key(&self.id)
    }

    /// Get parent node
    pub fn parent(&self) -> Option<Node> {
        self.with_data(|n| n.parent)
            .flatten()
            .map(|id| Node::new(id, self.tree.clone()))
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self) -> Vec<Node> {
        self.tree
            .strict_ancestors(self.id)
            .into_iter()
            .map(|id| Node::new(id, self.tree.clone()))
            .collect()
    }

    /// True when `other` is this node or one of its ancestors
    pub fn is_inclusive_descendant_of(&self, other: NodeId) -> bool {
        self.id == other || self.tree.strict_ancestors(self.id).contains(&other)
    }

    /// Get child nodes
    pub fn children(&self) -> Vec<Node> {
        self.with_data(|n| {
            n.children
                .iter()
                .map(|&id| Node::new(id, self.tree.clone()))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Element children only
    pub fn element_children(&self) -> Vec<Node> {
        self.children().into_iter().filter(|c| c.is_element()).collect()
    }

    /// Get first child
    pub fn first_child(&self) -> Option<Node> {
        self.children().into_iter().next()
    }

    /// Get last child
    pub fn last_child(&self) -> Option<Node> {
        self.children().pop()
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    /// Append a child node, moving it from its current parent if any.
    ///
    /// Both nodes must belong to the same document; see
    /// [`Document::import_node`](super::Document::import_node) otherwise.
    pub fn append_child(&self, child: &Node) {
        if !self.same_tree(child) || child.id == self.id {
            tracing::debug!(parent = self.id.as_u64(), child = child.id.as_u64(), "Ignoring append of foreign node");
            return;
        }
        if self.is_inclusive_descendant_of(child.id) {
            tracing::debug!("Ignoring append that would create a cycle");
            return;
        }

        let old_parent = {
            let mut nodes = self.tree.nodes.write();
            let old_parent = nodes.get(&child.id).and_then(|d| d.parent);

            if let Some(pid) = old_parent {
                if let Some(parent) = nodes.get_mut(&pid) {
                    parent.children.retain(|&id| id != child.id);
                }
            }
            if let Some(child_data) = nodes.get_mut(&child.id) {
                child_data.parent = Some(self.id);
            }
            if let Some(parent_data) = nodes.get_mut(&self.id) {
                parent_data.children.push(child.id);
            }
            old_parent
        };

        if let Some(pid) = old_parent {
            let previous = Node::new(pid, self.tree.clone());
            previous.notify(MutationRecord::child_list(
                previous.clone(),
                Vec::new(),
                vec![child.clone()],
            ));
        }
        self.notify(MutationRecord::child_list(
            self.clone(),
            vec![child.clone()],
            Vec::new(),
        ));
    }

    /// Remove a child node
    pub fn remove_child(&self, child: &Node) {
        let removed = {
            let mut nodes = self.tree.nodes.write();
            let is_child = nodes
                .get(&child.id)
                .map(|d| d.parent == Some(self.id))
                .unwrap_or(false);
            if is_child {
                if let Some(parent_data) = nodes.get_mut(&self.id) {
                    parent_data.children.retain(|&id| id != child.id);
                }
                if let Some(child_data) = nodes.get_mut(&child.id) {
                    child_data.parent = None;
                }
            }
            is_child
        };

        if removed {
            self.notify(MutationRecord::child_list(
                self.clone(),
                Vec::new(),
                vec![child.clone()],
            ));
        }
    }

    fn notify(&self, record: MutationRecord) {
        if !self.tree.mutations.has_observers() {
            return;
        }
        let ancestors = self.tree.strict_ancestors(record.target.id);
        self.tree.mutations.enqueue(record, &ancestors);
    }

    /// Get inner HTML
    pub fn inner_html(&self) -> String {
        let nodes = self.tree.nodes.read();
        nodes
            .get(&self.id)
            .map(|node| {
                node.children
                    .iter()
                    .map(|&id| serialize_node(&nodes, id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get outer HTML
    pub fn outer_html(&self) -> String {
        let nodes = self.tree.nodes.read();
        serialize_node(&nodes, self.id)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.local_name())
            .finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn collect_text(nodes: &HashMap<NodeId, NodeData>, node_id: NodeId) -> String {
    match nodes.get(&node_id) {
        Some(node) => match node.node_type {
            NodeType::Text => node.text_content.clone().unwrap_or_default(),
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment => node
                .children
                .iter()
                .map(|&child| collect_text(nodes, child))
                .collect(),
            _ => String::new(),
        },
        None => String::new(),
    }
}

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn serialize_node(nodes: &HashMap<NodeId, NodeData>, node_id: NodeId) -> String {
    let Some(node) = nodes.get(&node_id) else {
        return String::new();
    };

    match node.node_type {
        NodeType::Text => html_escape(node.text_content.as_deref().unwrap_or("")),
        NodeType::Comment => format!("<!--{}-->", node.text_content.as_deref().unwrap_or("")),
        NodeType::Element => {
            let tag = node.tag_name.as_deref().unwrap_or("div");
            let mut attrs: Vec<_> = node.attributes.iter().collect();
            attrs.sort();
            let attrs: String = attrs
                .into_iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        format!(" {}", k)
                    } else {
                        format!(" {}=\"{}\"", k, html_escape(v))
                    }
                })
                .collect();

            if VOID_ELEMENTS.contains(&tag) {
                format!("<{}{}>", tag, attrs)
            } else {
                let children: String = node
                    .children
                    .iter()
                    .map(|&id| serialize_node(nodes, id))
                    .collect();
                format!("<{}{}>{}</{}>", tag, attrs, children, tag)
            }
        }
        NodeType::Document | NodeType::DocumentFragment => node
            .children
            .iter()
            .map(|&id| serialize_node(nodes, id))
            .collect(),
        NodeType::DocumentType => "<!DOCTYPE html>".to_string(),
    }
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
