// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Best-effort origin attribution from call stacks
//!
//! Attribution is a heuristic. It never fails loudly: anything that cannot be
//! attributed yields `None` and the engine substitutes a sentinel.

use std::backtrace::Backtrace;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `location:line`, where location is an http(s) URL or a path-like token
    static ref FRAME_REGEX: Regex =
        Regex::new(r"(https?://[^/\s]+[^:\s]*|[^:\s()]+):(\d+)").expect("frame pattern compiles");

    /// Function line of a Rust backtrace frame: `  12: path::to::function`
    static ref SYMBOL_REGEX: Regex =
        Regex::new(r"^\s*\d+:\s+(\S.*)$").expect("symbol pattern compiles");
}

/// Fragments of frames that belong to the runtime or to this crate's own
/// instrumentation. Each is matched against the frame's location and, for
/// Rust backtraces, its function path.
pub const DEFAULT_IGNORED_FRAMES: &[&str] = &[
    "/rustc/",
    "/library/std/",
    "/library/core/",
    "/library/alloc/",
    "/library/test/",
    "/.cargo/registry/",
    "/.cargo/git/",
    "urlhook::hook::",
    "urlhook::window::",
    "urlhook::dom::",
    "urlhook::http::",
];

/// Produces an origin string for the code currently calling into a hook
pub trait SourceAttributor: Send + Sync {
    fn attribute(&self) -> Option<String>;
}

/// Renders the current call stack as text, one frame per line or pair of lines
pub type StackCapture = Arc<dyn Fn() -> String + Send + Sync>;

/// Attributes to the first informative frame of a captured stack
pub struct StackTraceAttributor {
    capture: StackCapture,
    skip: usize,
    ignore: Vec<String>,
}

impl StackTraceAttributor {
    /// Attributor over native Rust backtraces
    pub fn new() -> Self {
        Self {
            capture: Arc::new(|| Backtrace::force_capture().to_string()),
            skip: 0,
            ignore: DEFAULT_IGNORED_FRAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Attributor over a custom stack source, such as a script engine's
    /// error stack. The first two located frames are taken to be the hook and
    /// the attributor themselves.
    pub fn with_capture<F>(capture: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            capture: Arc::new(capture),
            skip: 2,
            ignore: Vec::new(),
        }
    }

    /// Number of located frames to drop from the top
    pub fn skip_frames(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Also drop frames whose location or function contains `fragment`
    pub fn ignore(mut self, fragment: impl Into<String>) -> Self {
        self.ignore.push(fragment.into());
        self
    }
}

impl Default for StackTraceAttributor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StackTraceAttributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackTraceAttributor")
            .field("skip", &self.skip)
            .field("ignore", &self.ignore)
            .finish()
    }
}

impl SourceAttributor for StackTraceAttributor {
    fn attribute(&self) -> Option<String> {
        let stack =
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (self.capture)())) {
                Ok(stack) => stack,
                Err(_) => {
                    tracing::debug!("Stack capture panicked");
                    return None;
                }
            };
        parse_stack(&stack, self.skip, self.ignore.as_slice())
    }
}

/// Find the first informative frame in `stack`.
///
/// Lines without a `location:line` token are not frames; in Rust backtraces
/// the numbered line before a location names its function. The first `skip`
/// frames are dropped, then any frame whose location or function contains
/// one of `ignore`. Returns `location:line` of the first frame left.
pub fn parse_stack<S: AsRef<str>>(stack: &str, skip: usize, ignore: &[S]) -> Option<String> {
    let mut function = None;
    stack
        .lines()
        .filter_map(|line| {
            if let Some(caps) = SYMBOL_REGEX.captures(line) {
                function = caps.get(1).map(|m| m.as_str());
                return None;
            }
            FRAME_REGEX
                .captures(line)
                .map(|caps| (function.take(), caps))
        })
        .skip(skip)
        .find(|(function, caps)| {
            let location = &caps[1];
            !ignore.iter().any(|fragment| {
                let fragment = fragment.as_ref();
                location.contains(fragment) || function.map_or(false, |f| f.contains(fragment))
            })
        })
        .map(|(_, caps)| format!("{}:{}", &caps[1], &caps[2]))
}

/// Always attributes to one origin
#[derive(Debug, Clone)]
pub struct FixedAttributor(pub String);

impl FixedAttributor {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }
}

impl SourceAttributor for FixedAttributor {
    fn attribute(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Never attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttributor;

impl SourceAttributor for NoAttributor {
    fn attribute(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_IGNORE: &[&str] = &[];

    #[test]
    fn test_script_engine_stack() {
        let stack = "Error\n    at hook (https://self.test/hook.js:10:3)\n    at open (https://self.test/hook.js:20:5)\n    at load (https://cdn.test/app.js:42:7)";
        assert_eq!(
            parse_stack(stack, 2, NO_IGNORE).as_deref(),
            Some("https://cdn.test/app.js:42")
        );
    }

    #[test]
    fn test_firefox_style_frame() {
        let stack = "send@https://cdn.test/lib.min.js:1:2048";
        assert_eq!(
            parse_stack(stack, 0, NO_IGNORE).as_deref(),
            Some("https://cdn.test/lib.min.js:1")
        );
    }

    #[test]
    fn test_rust_backtrace_skips_instrumentation() {
        let stack = "   0: urlhook::hook::attribution::capture\n             at ./src/hook/attribution.rs:52:24\n   1: <urlhook::hook::interceptors::network::FetchInterceptor as urlhook::window::natives::Fetch>::fetch\n             at ./src/hook/interceptors/network.rs:60:13\n   2: urlhook::window::window::Window::fetch\n             at ./src/window/window.rs:210:9\n   3: app::main\n             at ./src/main.rs:14:5\n   4: std::rt::lang_start\n             at /rustc/abc/library/std/src/rt.rs:159:18";
        assert_eq!(
            parse_stack(stack, 0, DEFAULT_IGNORED_FRAMES).as_deref(),
            Some("./src/main.rs:14")
        );
    }

    #[test]
    fn test_consumer_modules_named_like_ours_are_kept() {
        let stack = "   0: urlhook::window::window::Window::xhr_open\n             at /deps/urlhook-0.1.0/src/window/window.rs:198:9\n   1: app::hook::beacon::send\n             at ./src/hook/beacon.rs:9:5\n   2: app::main\n             at ./src/main.rs:3:5";
        assert_eq!(
            parse_stack(stack, 0, DEFAULT_IGNORED_FRAMES).as_deref(),
            Some("./src/hook/beacon.rs:9")
        );
    }

    #[test]
    fn test_frames_without_location_are_skipped() {
        let stack = "   0: urlhook::hook::engine::HookEngine::report\n   1: 0x55d4c2a1b3f0 - <unknown>\n   2: app::load\n             at src/load.rs:27:13";
        assert_eq!(
            parse_stack(stack, 0, DEFAULT_IGNORED_FRAMES).as_deref(),
            Some("src/load.rs:27")
        );
    }

    #[test]
    fn test_empty_stack_has_no_source() {
        assert_eq!(parse_stack("", 0, NO_IGNORE), None);
        assert_eq!(parse_stack("Error\n", 0, NO_IGNORE), None);
        assert_eq!(parse_stack("at a.js:1:1", 1, NO_IGNORE), None);
    }

    #[test]
    fn test_custom_capture() {
        let attributor = StackTraceAttributor::with_capture(|| {
            "Error\n at a (h.js:1:1)\n at b (h.js:2:1)\n at c (https://x.test/c.js:3:1)".to_string()
        });
        assert_eq!(attributor.attribute().as_deref(), Some("https://x.test/c.js:3"));
    }

    #[test]
    fn test_panicking_capture_is_contained() {
        let attributor = StackTraceAttributor::with_capture(|| panic!("no stack"));
        assert_eq!(attributor.attribute(), None);
    }

    #[test]
    fn test_fixed_and_none() {
        assert_eq!(FixedAttributor::new("x.js").attribute().as_deref(), Some("x.js"));
        assert_eq!(NoAttributor.attribute(), None);
    }
}
