// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Native capabilities of a headless window
//!
//! Each trait here is one page-facing API. The `Native*` types implement the
//! browser behavior and are what a fresh [`Window`](super::Window) puts in
//! its capability slots.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::network::{NetworkLog, RequestKind, RequestOutcome};
use crate::dom::{Document, Element};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Method, Request, Response};

impl RequestOutcome {
    pub(crate) fn of(result: &Result<Response>) -> Self {
        match result {
            Ok(response) => RequestOutcome::Completed {
                status: response.status_code(),
                duration_ms: response.elapsed_ms,
            },
            Err(e) => RequestOutcome::Failed(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// XMLHttpRequest
// ---------------------------------------------------------------------------

/// XMLHttpRequest ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum XhrReadyState {
    #[default]
    Unsent,
    Opened,
    HeadersReceived,
    Loading,
    Done,
}

#[derive(Debug, Default)]
struct XhrState {
    ready_state: XhrReadyState,
    method: Option<Method>,
    url: Option<Url>,
    status: u16,
    response_text: String,
}

/// A headless XMLHttpRequest object. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct XmlHttpRequest {
    state: Arc<RwLock<XhrState>>,
}

impl XmlHttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_state(&self) -> XhrReadyState {
        self.state.read().ready_state
    }

    pub fn method(&self) -> Option<Method> {
        self.state.read().method.clone()
    }

    pub fn url(&self) -> Option<Url> {
        self.state.read().url.clone()
    }

    pub fn status(&self) -> u16 {
        self.state.read().status
    }

    pub fn response_text(&self) -> String {
        self.state.read().response_text.clone()
    }

    fn set_opened(&self, method: Method, url: Url) {
        let mut state = self.state.write();
        *state = XhrState {
            ready_state: XhrReadyState::Opened,
            method: Some(method),
            url: Some(url),
            ..Default::default()
        };
    }

    pub(crate) fn set_done(&self, status: u16, response_text: String) {
        let mut state = self.state.write();
        state.ready_state = XhrReadyState::Done;
        state.status = status;
        state.response_text = response_text;
    }

    /// Method and URL of an opened request
    pub(crate) fn opened_target(&self) -> Result<(Method, Url)> {
        let state = self.state.read();
        match (&state.ready_state, &state.method, &state.url) {
            (XhrReadyState::Opened, Some(method), Some(url)) => Ok((method.clone(), url.clone())),
            _ => Err(Error::dom("InvalidStateError: the object's state must be OPENED")),
        }
    }
}

/// `XMLHttpRequest.prototype.open`
pub trait XhrOpen: Send + Sync {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) -> Result<()>;
}

/// Browser `open`: validates the method, resolves the URL against the document
pub struct NativeXhrOpen {
    document: Document,
}

impl NativeXhrOpen {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl XhrOpen for NativeXhrOpen {
    fn open(&self, xhr: &XmlHttpRequest, method: &str, url: &str) -> Result<()> {
        let method = Request::parse_method(method)?;
        let url = self.document.resolve_url(url)?;
        xhr.set_opened(method, url);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// fetch
// ---------------------------------------------------------------------------

/// First argument of `fetch`
#[derive(Debug, Clone)]
pub enum FetchInput {
    /// A URL string, possibly relative
    Url(String),
    Request(Request),
}

impl FetchInput {
    /// The URL as the caller gave it
    pub fn url(&self) -> String {
        match self {
            FetchInput::Url(url) => url.clone(),
            FetchInput::Request(request) => request.url.to_string(),
        }
    }
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        FetchInput::Url(url)
    }
}

impl From<Url> for FetchInput {
    fn from(url: Url) -> Self {
        FetchInput::Url(url.to_string())
    }
}

impl From<Request> for FetchInput {
    fn from(request: Request) -> Self {
        FetchInput::Request(request)
    }
}

/// Pending result of a fetch
pub type FetchFuture = BoxFuture<'static, Result<Response>>;

/// `window.fetch`
pub trait Fetch: Send + Sync {
    fn fetch(&self, input: FetchInput) -> FetchFuture;
}

/// Browser fetch over the window's HTTP client
pub struct NativeFetch {
    client: HttpClient,
    document: Document,
    network: NetworkLog,
}

impl NativeFetch {
    pub fn new(client: HttpClient, document: Document, network: NetworkLog) -> Self {
        Self {
            client,
            document,
            network,
        }
    }
}

impl Fetch for NativeFetch {
    fn fetch(&self, input: FetchInput) -> FetchFuture {
        // Resolve now, against the URL the document has at call time
        let request = match input {
            FetchInput::Url(url) => self
                .document
                .resolve_url(&url)
                .map(|url| Request::from_url(Method::GET, url)),
            FetchInput::Request(request) => Ok(request),
        };
        let client = self.client.clone();
        let network = self.network.clone();

        Box::pin(async move {
            let request = request?;
            let method = request.method.to_string();
            let url = request.url.to_string();

            let result = client.execute(request).await;
            network.record(RequestKind::Fetch, method, url, RequestOutcome::of(&result));
            result
        })
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// `history.pushState` / `history.replaceState`
pub trait History: Send + Sync {
    fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()>;
    fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()>;
}

/// One session history entry
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub url: Option<Url>,
    pub state: Value,
    pub title: String,
}

#[derive(Debug)]
struct SessionState {
    entries: Vec<HistoryEntry>,
    index: usize,
}

/// Browser session history. Same-document navigations update the document URL.
#[derive(Debug)]
pub struct SessionHistory {
    document: Document,
    session: RwLock<SessionState>,
}

impl SessionHistory {
    pub fn new(document: Document) -> Self {
        let first = HistoryEntry {
            url: document.url(),
            state: Value::Null,
            title: document.title(),
        };
        Self {
            document,
            session: RwLock::new(SessionState {
                entries: vec![first],
                index: 0,
            }),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.session.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The active entry
    pub fn current(&self) -> Option<HistoryEntry> {
        let session = self.session.read();
        session.entries.get(session.index).cloned()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.session.read().entries.clone()
    }

    /// New entry URL, which must stay on the document's origin
    fn target_url(&self, url: Option<&str>) -> Result<Option<Url>> {
        let current = self.document.url();
        let Some(reference) = url else {
            return Ok(current);
        };

        let resolved = self.document.resolve_url(reference)?;
        match &current {
            Some(current) if current.origin() == resolved.origin() => Ok(Some(resolved)),
            Some(current) => Err(Error::security(format!(
                "SecurityError: a history state object with URL '{}' cannot be created in a document with origin '{}'",
                resolved,
                current.origin().ascii_serialization()
            ))),
            None => Err(Error::security(format!(
                "SecurityError: a history state object with URL '{}' cannot be created in a document without an origin",
                resolved
            ))),
        }
    }

    fn update(&self, replace: bool, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        let target = self.target_url(url)?;
        let entry = HistoryEntry {
            url: target.clone(),
            state,
            title: title.to_string(),
        };

        {
            let mut session = self.session.write();
            let index = session.index;
            if replace {
                if let Some(slot) = session.entries.get_mut(index) {
                    *slot = entry;
                }
            } else {
                session.entries.truncate(index + 1);
                session.entries.push(entry);
                session.index = session.entries.len() - 1;
            }
        }

        if let Some(url) = target {
            self.document.set_url(url);
        }
        Ok(())
    }
}

impl History for SessionHistory {
    fn push_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.update(false, state, title, url)
    }

    fn replace_state(&self, state: Value, title: &str, url: Option<&str>) -> Result<()> {
        self.update(true, state, title, url)
    }
}

// ---------------------------------------------------------------------------
// document.createElement
// ---------------------------------------------------------------------------

/// `document.createElement`
pub trait ElementFactory: Send + Sync {
    fn create_element(&self, tag: &str) -> Result<Element>;
}

/// Browser element creation on the window's document
pub struct NativeElementFactory {
    document: Document,
}

impl NativeElementFactory {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

impl ElementFactory for NativeElementFactory {
    fn create_element(&self, tag: &str) -> Result<Element> {
        if !is_valid_tag_name(tag) {
            return Err(Error::dom(format!(
                "InvalidCharacterError: '{}' is not a valid tag name",
                tag
            )));
        }
        Ok(self.document.create_element(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::blank_document;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn document(url: &str) -> Document {
        blank_document(Some(Url::parse(url).unwrap())).unwrap()
    }

    #[test]
    fn test_xhr_open_resolves_relative_url() {
        let native = NativeXhrOpen::new(document("https://app.test/dir/page"));
        let xhr = XmlHttpRequest::new();

        native.open(&xhr, "post", "api/items").unwrap();

        assert_eq!(xhr.ready_state(), XhrReadyState::Opened);
        assert_eq!(xhr.method(), Some(Method::POST));
        assert_eq!(xhr.url().unwrap().as_str(), "https://app.test/dir/api/items");
    }

    #[test]
    fn test_xhr_open_rejects_bad_method() {
        let native = NativeXhrOpen::new(document("https://app.test/"));
        let xhr = XmlHttpRequest::new();

        assert!(native.open(&xhr, "GE T", "/x").is_err());
        assert_eq!(xhr.ready_state(), XhrReadyState::Unsent);
        assert!(xhr.opened_target().is_err());
    }

    #[tokio::test]
    async fn test_native_fetch_records_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lib.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let network = NetworkLog::new(100);
        let fetch = NativeFetch::new(
            HttpClient::new().unwrap(),
            document(&format!("{}/index.html", server.uri())),
            network.clone(),
        );

        let response = fetch.fetch("/lib.js".into()).await.unwrap();
        assert_eq!(response.text_lossy(), "ok");

        let records = network.records_by_kind(RequestKind::Fetch);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Some(200));
    }

    #[tokio::test]
    async fn test_native_fetch_rejects_unresolvable_url() {
        let fetch = NativeFetch::new(
            HttpClient::new().unwrap(),
            Document::new(),
            NetworkLog::new(10),
        );
        assert!(fetch.fetch("/relative".into()).await.is_err());
    }

    #[test]
    fn test_history_push_and_replace() {
        let doc = document("https://app.test/start");
        let history = SessionHistory::new(doc.clone());

        history
            .push_state(serde_json::json!({"step": 1}), "", Some("/step/1"))
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(doc.url_string().as_deref(), Some("https://app.test/step/1"));

        history.replace_state(Value::Null, "", Some("/step/2")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.current().unwrap().url.unwrap().as_str(),
            "https://app.test/step/2"
        );

        history.push_state(Value::Null, "", None).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(doc.url_string().as_deref(), Some("https://app.test/step/2"));
    }

    #[test]
    fn test_history_rejects_cross_origin() {
        let doc = document("https://app.test/start");
        let history = SessionHistory::new(doc.clone());

        let err = history
            .push_state(Value::Null, "", Some("https://evil.test/x"))
            .unwrap_err();
        assert!(err.is_security());
        assert_eq!(history.len(), 1);
        assert_eq!(doc.url_string().as_deref(), Some("https://app.test/start"));
    }

    #[test]
    fn test_element_factory_validates_tag() {
        let factory = NativeElementFactory::new(document("https://app.test/"));
        assert_eq!(factory.create_element("IFRAME").unwrap().local_name(), "iframe");
        assert!(factory.create_element("1div").is_err());
        assert!(factory.create_element("").is_err());
    }
}
