// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Headless browsing context

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::capability::Slot;
use super::config::WindowConfig;
use super::console::Console;
use super::events::{Event, EventListener, EventRegistry, EventType, ListenerTarget};
use super::natives::{
    ElementFactory, Fetch, FetchFuture, FetchInput, History, NativeElementFactory, NativeFetch,
    NativeXhrOpen, SessionHistory, XhrOpen, XmlHttpRequest,
};
use super::network::{NetworkLog, NetworkRecord, RequestKind, RequestOutcome};
use crate::dom::{
    blank_document, parse_html_with_url, Document, Element, MutationCallback,
    MutationObserverOptions, Node, ObserverId,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Request, Response};

/// Document loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// A queued unit of asynchronous work
pub type Task = BoxFuture<'static, ()>;

/// FIFO of window tasks. Clones share the queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<VecDeque<Task>>>,
}

impl TaskQueue {
    pub fn push(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }

    fn pop(&self) -> Option<Task> {
        self.tasks.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue").field("pending", &self.len()).finish()
    }
}

/// A headless window: one document plus the native APIs a page can call
pub struct Window {
    config: WindowConfig,
    document: Document,
    client: HttpClient,
    console: Console,
    network: NetworkLog,
    session: Arc<SessionHistory>,
    xhr: Slot<dyn XhrOpen>,
    fetch: Slot<dyn Fetch>,
    history: Slot<dyn History>,
    elements: Slot<dyn ElementFactory>,
    events: EventRegistry,
    ready_state: RwLock<ReadyState>,
    tasks: TaskQueue,
    instrumented: AtomicBool,
}

impl Window {
    /// A window at document start: empty head and body, still loading
    pub fn new(config: WindowConfig) -> Result<Self> {
        let document = blank_document(config.parsed_url()?)?;
        Self::with_document(document, config, ReadyState::Loading)
    }

    /// A window over already parsed markup
    pub fn from_html(html: &str, config: WindowConfig) -> Result<Self> {
        let document = parse_html_with_url(html, config.parsed_url()?)?;
        Self::with_document(document, config, ReadyState::Complete)
    }

    pub fn with_document(
        document: Document,
        config: WindowConfig,
        ready_state: ReadyState,
    ) -> Result<Self> {
        let client = HttpClient::with_config(config.http_config())?;
        let network = NetworkLog::new(config.max_network_records);
        let session = Arc::new(SessionHistory::new(document.clone()));

        let xhr: Arc<dyn XhrOpen> = Arc::new(NativeXhrOpen::new(document.clone()));
        let fetch: Arc<dyn Fetch> = Arc::new(NativeFetch::new(
            client.clone(),
            document.clone(),
            network.clone(),
        ));
        let history: Arc<dyn History> = session.clone();
        let elements: Arc<dyn ElementFactory> =
            Arc::new(NativeElementFactory::new(document.clone()));

        tracing::debug!(url = ?document.url_string(), ?ready_state, "Window created");

        Ok(Self {
            config,
            document,
            client,
            console: Console::new(),
            network,
            session,
            xhr: Slot::new(xhr),
            fetch: Slot::new(fetch),
            history: Slot::new(history),
            elements: Slot::new(elements),
            events: EventRegistry::default(),
            ready_state: RwLock::new(ready_state),
            tasks: TaskQueue::default(),
            instrumented: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn network(&self) -> &NetworkLog {
        &self.network
    }

    /// Current document URL
    pub fn location(&self) -> Option<Url> {
        self.document.url()
    }

    /// Read-only view of session history
    pub fn session_history(&self) -> &SessionHistory {
        &self.session
    }

    // -- capability slots ---------------------------------------------------

    pub fn xhr_capability(&self) -> &Slot<dyn XhrOpen> {
        &self.xhr
    }

    pub fn fetch_capability(&self) -> &Slot<dyn Fetch> {
        &self.fetch
    }

    pub fn history_capability(&self) -> &Slot<dyn History> {
        &self.history
    }

    pub fn element_capability(&self) -> &Slot<dyn ElementFactory> {
        &self.elements
    }

    // -- page-facing API ----------------------------------------------------

    /// `xhr.open(method, url)`
    pub fn xhr_open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) -> Result<()> {
        self.xhr.get().open(xhr, method, url)
    }

    /// `xhr.send(body)` for an opened request
    pub async fn xhr_send(&self, xhr: &XmlHttpRequest, body: Option<Bytes>) -> Result<Response> {
        let (method, url) = xhr.opened_target()?;
        let mut request = Request::from_url(method, url);
        if let Some(body) = body {
            request = request.body(body);
        }
        let method = request.method.to_string();
        let target = request.url.to_string();

        let result = self.client.execute(request).await;
        self.network
            .record(RequestKind::Xhr, method, target, RequestOutcome::of(&result));
        if let Ok(response) = &result {
            xhr.set_done(response.status_code(), response.text_lossy());
        }
        result
    }

    /// `fetch(input)`
    pub fn fetch(&self, input: impl Into<FetchInput>) -> FetchFuture {
        self.fetch.get().fetch(input.into())
    }

    /// `history.pushState(state, title, url)`
    pub fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.history.get().push_state(state, title, url)
    }

    /// `history.replaceState(state, title, url)`
    pub fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.history.get().replace_state(state, title, url)
    }

    /// `document.createElement(tag)`
    pub fn create_element(&self, tag: &str) -> Result<Element> {
        self.elements.get().create_element(tag)
    }

    // -- events -------------------------------------------------------------

    /// `document.addEventListener(type, listener)`
    pub fn add_event_listener(&self, event_type: EventType, listener: EventListener) {
        self.events.add(ListenerTarget::Document, event_type, listener);
    }

    /// `element.addEventListener(type, listener)`
    pub fn add_element_listener(
        &self,
        element: &Element,
        event_type: EventType,
        listener: EventListener,
    ) {
        self.events
            .add(ListenerTarget::Node(element.node.id), event_type, listener);
    }

    pub fn listener_count(&self, target: ListenerTarget, event_type: EventType) -> usize {
        self.events.count(target, event_type)
    }

    /// Dispatch an event; false when a listener prevented the default action
    pub fn dispatch_event(&self, event: &Event) -> bool {
        let proceed = self.events.dispatch(event, &self.console);
        self.perform_microtask_checkpoint();
        proceed
    }

    /// User click on `element`, with the browser's default action.
    ///
    /// Returns whether the default action ran.
    pub fn click(&self, element: &Element) -> Result<bool> {
        let event = Event::new(EventType::Click, Some(element.clone()));
        if !self.dispatch_event(&event) {
            return Ok(false);
        }

        if let Some(href) = element.closest("a").and_then(|a| a.href()) {
            let url = self.document.resolve_url(&href)?;
            self.navigate(url, "GET");
            return Ok(true);
        }

        if is_submit_button(element) {
            if let Some(form) = element.form() {
                return self.submit(&form);
            }
        }
        Ok(true)
    }

    /// Form submission, with the browser's default action.
    ///
    /// Returns whether the form was submitted.
    pub fn submit(&self, form: &Element) -> Result<bool> {
        let event = Event::new(EventType::Submit, Some(form.clone()));
        if !self.dispatch_event(&event) {
            return Ok(false);
        }

        let url = form_action_url(&self.document, form)?;
        self.navigate(url, &form.method());
        Ok(true)
    }

    /// Record a navigation away from the page. The window stays on its document.
    fn navigate(&self, url: Url, method: &str) {
        tracing::info!(%url, method, "Navigation requested");
        self.network
            .record(RequestKind::Navigation, method, url.as_str(), RequestOutcome::Pending);
    }

    /// Navigations requested so far
    pub fn navigations(&self) -> Vec<NetworkRecord> {
        self.network.records_by_kind(RequestKind::Navigation)
    }

    // -- mutation observers ---------------------------------------------------

    /// `new MutationObserver(callback).observe(target, options)`
    pub fn observe(
        &self,
        target: &Node,
        options: MutationObserverOptions,
        callback: MutationCallback,
    ) -> Result<ObserverId> {
        self.document.observe(target, options, callback)
    }

    /// Deliver pending mutation records
    pub fn perform_microtask_checkpoint(&self) -> usize {
        self.document.deliver_mutations()
    }

    // -- loading --------------------------------------------------------------

    pub fn ready_state(&self) -> ReadyState {
        *self.ready_state.read()
    }

    /// Advance the ready state, firing DOMContentLoaded and load on the way.
    ///
    /// Going backwards is ignored.
    pub fn set_ready_state(&self, state: ReadyState) {
        let previous = {
            let mut current = self.ready_state.write();
            if state <= *current {
                return;
            }
            std::mem::replace(&mut *current, state)
        };

        tracing::debug!(?previous, ?state, "Ready state changed");
        if previous == ReadyState::Loading {
            self.dispatch_event(&Event::new(EventType::DomContentLoaded, None));
        }
        if state == ReadyState::Complete {
            self.dispatch_event(&Event::new(EventType::Load, None));
        }
    }

    /// Parse `html` and insert its head and body content into the live
    /// document, as the parser would while loading.
    ///
    /// Returns the number of top-level nodes inserted.
    pub fn import_html(&self, html: &str) -> Result<usize> {
        let source = parse_html_with_url(html, self.document.url())?;
        let mut inserted = 0;

        let pairs = [
            (source.head(), self.document.head()),
            (source.body(), self.document.body()),
        ];
        for (from, into) in pairs {
            let (Some(from), Some(into)) = (from, into) else {
                continue;
            };
            for child in from.node.children() {
                let copy = self.document.import_node(&child, true)?;
                into.append_child(&copy);
                inserted += 1;
            }
        }

        if self.document.title().is_empty() {
            self.document.set_title(source.title());
        }
        self.perform_microtask_checkpoint();
        Ok(inserted)
    }

    /// Fetch the document URL and stream its content into this window, then
    /// mark the document interactive.
    pub async fn load(&self) -> Result<Response> {
        let url = self
            .location()
            .ok_or_else(|| Error::navigation("about:blank", "window has no document URL"))?;

        let result = self.client.get(url.as_str()).await;
        self.network.record(
            RequestKind::Navigation,
            "GET",
            url.as_str(),
            RequestOutcome::of(&result),
        );
        let response = result?;
        if !response.is_success() {
            return Err(Error::navigation(
                url.as_str(),
                format!("HTTP {}", response.status_code()),
            ));
        }

        self.import_html(&response.text_lossy())?;
        self.set_ready_state(ReadyState::Interactive);
        Ok(response)
    }

    // -- tasks ----------------------------------------------------------------

    pub fn task_queue(&self) -> TaskQueue {
        self.tasks.clone()
    }

    pub fn queue_task<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(Box::pin(task));
    }

    /// Run queued tasks, including ones queued while running, until none are
    /// left. A microtask checkpoint follows each task.
    pub async fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.tasks.pop() {
            task.await;
            self.perform_microtask_checkpoint();
            ran += 1;
        }
        ran
    }

    // -- instrumentation marker -----------------------------------------------

    pub fn is_instrumented(&self) -> bool {
        self.instrumented.load(Ordering::SeqCst)
    }

    /// Set the install marker. False if it was already set.
    pub fn mark_instrumented(&self) -> bool {
        self.instrumented
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("url", &self.document.url_string())
            .field("ready_state", &self.ready_state())
            .field("instrumented", &self.is_instrumented())
            .field("tasks", &self.tasks)
            .finish()
    }
}

fn is_submit_button(element: &Element) -> bool {
    let kind = element
        .get_attribute("type")
        .map(|t| t.to_ascii_lowercase());
    match element.local_name().as_str() {
        "button" => kind.map_or(true, |t| t == "submit"),
        "input" => matches!(kind.as_deref(), Some("submit") | Some("image")),
        _ => false,
    }
}

/// Form action resolved against the document; empty means the document URL
pub(crate) fn form_action_url(document: &Document, form: &Element) -> Result<Url> {
    match form.action().filter(|a| !a.trim().is_empty()) {
        Some(action) => document.resolve_url(action.trim()),
        None => document
            .url()
            .ok_or_else(|| Error::navigation("about:blank", "form has no action and document has no URL")),
    }
}
