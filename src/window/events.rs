// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! DOM events and listener dispatch

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::console::Console;
use crate::dom::{Element, NodeId, NodeType};
use crate::error::Result;

/// Event types the window dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Submit,
    DomContentLoaded,
    Load,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Submit => "submit",
            EventType::DomContentLoaded => "DOMContentLoaded",
            EventType::Load => "load",
        }
    }

    pub fn bubbles(&self) -> bool {
        matches!(self, EventType::Click | EventType::Submit)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatched event
#[derive(Debug)]
pub struct Event {
    event_type: EventType,
    target: Option<Element>,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
}

impl Event {
    /// `target` is `None` for events fired at the document itself
    pub fn new(event_type: EventType, target: Option<Element>) -> Self {
        Self {
            event_type,
            target,
            default_prevented: AtomicBool::new(false),
            propagation_stopped: AtomicBool::new(false),
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn target(&self) -> Option<&Element> {
        self.target.as_ref()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::SeqCst)
    }
}

/// Event listener callback
pub type EventListener = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Document,
    Node(NodeId),
}

#[derive(Default)]
pub(crate) struct EventRegistry {
    listeners: RwLock<HashMap<(ListenerTarget, EventType), Vec<EventListener>>>,
}

impl EventRegistry {
    pub(crate) fn add(&self, target: ListenerTarget, event_type: EventType, listener: EventListener) {
        self.listeners
            .write()
            .entry((target, event_type))
            .or_default()
            .push(listener);
    }

    pub(crate) fn count(&self, target: ListenerTarget, event_type: EventType) -> usize {
        self.listeners
            .read()
            .get(&(target, event_type))
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn listeners_for(&self, target: ListenerTarget, event_type: EventType) -> Vec<EventListener> {
        self.listeners
            .read()
            .get(&(target, event_type))
            .cloned()
            .unwrap_or_default()
    }

    fn propagation_path(event: &Event) -> Vec<ListenerTarget> {
        let mut path = Vec::new();
        match event.target() {
            Some(target) => {
                path.push(ListenerTarget::Node(target.node.id));
                if event.event_type().bubbles() {
                    path.extend(
                        target
                            .ancestors()
                            .into_iter()
                            .filter(|a| a.node_type() != NodeType::Document)
                            .map(|a| ListenerTarget::Node(a.id)),
                    );
                    path.push(ListenerTarget::Document);
                }
            }
            None => path.push(ListenerTarget::Document),
        }
        path
    }

    /// Run listeners along the bubbling path.
    ///
    /// Listener failures are reported to the console and do not stop
    /// dispatch. Returns false when a listener cancelled the default action.
    pub(crate) fn dispatch(&self, event: &Event, console: &Console) -> bool {
        for target in Self::propagation_path(event) {
            for listener in self.listeners_for(target, event.event_type()) {
                let outcome =
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(event)));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => console.error(format!("Uncaught {} listener error: {}", event.event_type(), e)),
                    Err(_) => console.error(format!("Uncaught panic in {} listener", event.event_type())),
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        !event.default_prevented()
    }
}
