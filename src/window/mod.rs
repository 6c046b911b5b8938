// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Headless window model
//!
//! A [`Window`] owns a document and the native APIs a page can call on it.
//! Those APIs sit in replaceable [`Slot`]s so instrumentation can wrap them.

mod capability;
mod config;
mod console;
mod events;
mod natives;
mod network;
#[allow(clippy::module_inception)]
mod window;

pub use capability::Slot;
pub use config::WindowConfig;
pub use console::{Console, ConsoleLevel, ConsoleMessage};
pub use events::{Event, EventListener, EventType, ListenerTarget};
pub use natives::{
    ElementFactory, Fetch, FetchFuture, FetchInput, History, HistoryEntry, NativeElementFactory,
    NativeFetch, NativeXhrOpen, SessionHistory, XhrOpen, XhrReadyState, XmlHttpRequest,
};
pub use network::{NetworkLog, NetworkRecord, RequestKind, RequestOutcome};
pub use window::{ReadyState, Task, TaskQueue, Window};

pub(crate) use window::form_action_url;
