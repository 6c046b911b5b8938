// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interception points
//!
//! Each interceptor wraps one window capability, reports what it sees to the
//! engine and forwards the call to the implementation it replaced.

mod element;
mod interaction;
mod mutation;
mod navigation;
mod network;
mod scripts;

pub use element::{ElementInterceptor, SourceAttributeHook, WATCHED_ATTRIBUTES, WATCHED_TAGS};
pub use interaction::{ClickInterceptor, SubmitInterceptor};
pub use mutation::MutationInterceptor;
pub use navigation::HistoryInterceptor;
pub use network::{FetchInterceptor, XhrInterceptor};
pub use scripts::{HttpScriptLoader, ScanReport, ScriptLoader, ScriptScanner};
