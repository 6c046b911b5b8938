// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mutation observation
//!
//! Tree writes queue [`MutationRecord`]s for every interested observer. Records
//! are delivered in batches when the owning window reaches a microtask
//! checkpoint, never synchronously inside the write that produced them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::node::{Node, NodeId};
use crate::error::{Error, Result};

/// Upper bound on delivery rounds in a single checkpoint.
///
/// Observers whose callbacks keep mutating observed nodes would otherwise
/// never let the checkpoint finish.
pub const MAX_DELIVERY_ROUNDS: usize = 100;

/// Unique observer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Kind of tree change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    /// Children were added or removed
    ChildList,
    /// An attribute was written
    Attributes,
    /// Text or comment data changed
    CharacterData,
}

/// A single tree change
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// Node whose children, attributes or data changed
    pub target: Node,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub attribute_name: Option<String>,
    /// Previous value, only kept when the observer asked for it
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: Node, added: Vec<Node>, removed: Vec<Node>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub(crate) fn attributes(target: Node, name: String, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name),
            old_value,
        }
    }

    pub(crate) fn character_data(target: Node, old_value: Option<String>) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value,
        }
    }
}

/// Which changes an observer wants to see
#[derive(Debug, Clone, Default)]
pub struct MutationObserverOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    /// Also observe every descendant of the target
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    /// Restrict attribute records to these names
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverOptions {
    /// Every kind of change, over the whole subtree
    pub fn subtree_all() -> Self {
        Self {
            child_list: true,
            attributes: true,
            character_data: true,
            subtree: true,
            ..Default::default()
        }
    }

    fn wants(&self, record: &MutationRecord) -> bool {
        match record.kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => {
                self.attributes
                    && match (&self.attribute_filter, &record.attribute_name) {
                        (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                        _ => true,
                    }
            }
            MutationKind::CharacterData => self.character_data,
        }
    }

    fn wants_old_value(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::Attributes => self.attribute_old_value,
            MutationKind::CharacterData => self.character_data_old_value,
            MutationKind::ChildList => false,
        }
    }
}

/// Observer callback. Errors and panics are contained per delivery.
pub type MutationCallback = Arc<dyn Fn(&[MutationRecord]) -> Result<()> + Send + Sync>;

struct Observer {
    id: ObserverId,
    callback: MutationCallback,
    targets: Vec<(NodeId, MutationObserverOptions)>,
    pending: Vec<MutationRecord>,
}

/// Per-tree observer bookkeeping
#[derive(Default)]
pub(crate) struct MutationRegistry {
    observers: Mutex<Vec<Observer>>,
}

impl MutationRegistry {
    pub(crate) fn observe(
        &self,
        target: NodeId,
        options: MutationObserverOptions,
        callback: MutationCallback,
    ) -> ObserverId {
        let id = ObserverId::next();
        self.observers.lock().push(Observer {
            id,
            callback,
            targets: vec![(target, options)],
            pending: Vec::new(),
        });
        id
    }

    /// Observe another target with an existing observer. Re-observing a target
    /// replaces its options.
    pub(crate) fn observe_more(
        &self,
        id: ObserverId,
        target: NodeId,
        options: MutationObserverOptions,
    ) -> Result<()> {
        let mut observers = self.observers.lock();
        let observer = observers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| Error::dom(format!("unknown mutation observer {}", id.as_u64())))?;
        observer.targets.retain(|(t, _)| *t != target);
        observer.targets.push((target, options));
        Ok(())
    }

    pub(crate) fn disconnect(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.lock().is_empty()
    }

    /// Queue a record. `ancestors` are the target's strict ancestors, nearest first.
    pub(crate) fn enqueue(&self, record: MutationRecord, ancestors: &[NodeId]) {
        let mut observers = self.observers.lock();
        for observer in observers.iter_mut() {
            let interested = observer.targets.iter().find(|(target, options)| {
                let in_scope = *target == record.target.id
                    || (options.subtree && ancestors.contains(target));
                in_scope && options.wants(&record)
            });

            if let Some((_, options)) = interested {
                let mut queued = record.clone();
                if !options.wants_old_value(queued.kind) {
                    queued.old_value = None;
                }
                observer.pending.push(queued);
            }
        }
    }

    fn take_pending(&self) -> Vec<(ObserverId, MutationCallback, Vec<MutationRecord>)> {
        self.observers
            .lock()
            .iter_mut()
            .filter(|o| !o.pending.is_empty())
            .map(|o| (o.id, o.callback.clone(), std::mem::take(&mut o.pending)))
            .collect()
    }

    /// Deliver queued records until no observer has anything pending.
    ///
    /// Returns the number of records handed to callbacks.
    pub(crate) fn deliver(&self) -> usize {
        let mut delivered = 0;

        for round in 0..MAX_DELIVERY_ROUNDS {
            let batch = self.take_pending();
            if batch.is_empty() {
                return delivered;
            }

            for (id, callback, records) in batch {
                delivered += records.len();
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback(&records)
                }));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(observer = id.as_u64(), round, error = %e, "Mutation observer callback failed");
                    }
                    Err(_) => {
                        tracing::error!(observer = id.as_u64(), round, "Mutation observer callback panicked");
                    }
                }
            }
        }

        let dropped: usize = self.take_pending().iter().map(|(_, _, r)| r.len()).sum();
        tracing::warn!(
            rounds = MAX_DELIVERY_ROUNDS,
            dropped,
            "Mutation delivery did not settle, dropping remaining records"
        );
        delivered
    }
}

impl std::fmt::Debug for MutationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationRegistry")
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}
