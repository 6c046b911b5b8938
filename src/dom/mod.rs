// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM engine for HTML parsing and manipulation
//!
//! Provides a DOM-like interface built on top of html5ever, with attribute
//! hooks and batched mutation observation.

mod document;
mod element;
mod mutation;
mod node;
mod parser;
mod selector;

pub use document::Document;
pub use element::Element;
pub use mutation::{
    MutationCallback, MutationKind, MutationObserverOptions, MutationRecord, ObserverId,
    MAX_DELIVERY_ROUNDS,
};
pub use node::{AttributeHook, Node, NodeId, NodeType, WeakNode};
pub use parser::{blank_document, parse_html, parse_html_with_url};
pub use selector::Selector;
