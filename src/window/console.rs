// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Window console channel

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

/// Console message type
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Console log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// Captured console output. Cloning shares the buffer.
#[derive(Debug, Clone, Default)]
pub struct Console {
    messages: Arc<RwLock<Vec<ConsoleMessage>>>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, message: impl Into<String>) {
        self.push(ConsoleLevel::Log, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(ConsoleLevel::Info, message.into());
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.push(ConsoleLevel::Warn, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(ConsoleLevel::Error, message.into());
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.push(ConsoleLevel::Debug, message.into());
    }

    fn push(&self, level: ConsoleLevel, message: String) {
        match level {
            ConsoleLevel::Error => tracing::error!(target: "urlhook::console", "{}", message),
            ConsoleLevel::Warn => tracing::warn!(target: "urlhook::console", "{}", message),
            ConsoleLevel::Debug => tracing::debug!(target: "urlhook::console", "{}", message),
            ConsoleLevel::Log | ConsoleLevel::Info => {
                tracing::info!(target: "urlhook::console", "{}", message)
            }
        }

        self.messages.write().push(ConsoleMessage {
            level,
            message,
            timestamp: Utc::now(),
        });
    }

    /// All messages so far
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages.read().clone()
    }

    /// Message texts at one level
    pub fn lines(&self, level: ConsoleLevel) -> Vec<String> {
        self.messages
            .read()
            .iter()
            .filter(|m| m.level == level)
            .map(|m| m.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_levels() {
        let console = Console::new();
        let shared = console.clone();

        console.log("hello");
        shared.warn("careful");

        assert_eq!(console.messages().len(), 2);
        assert_eq!(console.lines(ConsoleLevel::Warn), vec!["careful".to_string()]);
        assert_eq!(shared.lines(ConsoleLevel::Log), vec!["hello".to_string()]);
    }
}
