// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Replaceable capability slots
//!
//! Every native API a page can call lives behind a [`Slot`]. Instrumentation
//! replaces the slot's implementation with a wrapper that owns the previous
//! one, so callers keep using the slot and never see the difference.

use std::sync::Arc;

use parking_lot::RwLock;

/// Holder of the current implementation of one capability
pub struct Slot<T: ?Sized> {
    current: RwLock<Arc<T>>,
}

impl<T: ?Sized> Slot<T> {
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Current implementation.
    ///
    /// The lock is released on return, so the implementation may call back
    /// into any slot, this one included.
    pub fn get(&self) -> Arc<T> {
        self.current.read().clone()
    }

    /// Replace the implementation with `wrapper(original)`.
    ///
    /// After this returns the slot no longer references the original; the
    /// wrapper is its only holder apart from calls already in flight.
    pub fn wrap<F>(&self, wrapper: F)
    where
        F: FnOnce(Arc<T>) -> Arc<T>,
    {
        let mut current = self.current.write();
        let original = current.clone();
        *current = wrapper(original);
    }

    /// Whether the slot still holds exactly `implementation`
    pub fn is(&self, implementation: &Arc<T>) -> bool {
        Arc::ptr_eq(&self.current.read(), implementation)
    }
}

impl<T: ?Sized> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
