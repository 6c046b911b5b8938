// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! One-shot scan of script bodies for embedded URLs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::hook::entry::{ContextTag, Discovery};
use crate::hook::HookEngine;
use crate::http::HttpClient;
use crate::window::{
    Console, EventType, NetworkLog, ReadyState, RequestKind, RequestOutcome, Window,
};

/// Fetches external script sources
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Body of the script at `url`. Non-success responses are errors.
    async fn load(&self, url: &Url) -> Result<String>;
}

/// Script loader over HTTP
#[derive(Debug, Clone)]
pub struct HttpScriptLoader {
    client: HttpClient,
    network: Option<NetworkLog>,
}

impl HttpScriptLoader {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            network: None,
        }
    }

    /// Record each script request in `log`
    pub fn with_network_log(mut self, log: NetworkLog) -> Self {
        self.network = Some(log);
        self
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(&self, url: &Url) -> Result<String> {
        let result = self.client.get(url.as_str()).await;
        if let Some(network) = &self.network {
            network.record(
                RequestKind::Script,
                "GET",
                url.as_str(),
                RequestOutcome::of(&result),
            );
        }

        let response = result.map_err(|e| Error::script_fetch(url.as_str(), None, e.to_string()))?;
        if !response.is_success() {
            return Err(Error::script_fetch(
                url.as_str(),
                Some(response.status_code()),
                format!("HTTP {}", response.status_line()),
            ));
        }
        Ok(response.text_lossy())
    }
}

/// Outcome of a script scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub external_scanned: usize,
    pub external_failed: usize,
    pub inline_scanned: usize,
    /// New URLs reported by this scan
    pub reported: usize,
}

/// Scans every script of a document once: external sources first, in
/// document order, then inline bodies
pub struct ScriptScanner {
    engine: HookEngine,
    document: Document,
    console: Console,
    loader: Arc<dyn ScriptLoader>,
    started: AtomicBool,
}

impl ScriptScanner {
    pub fn new(engine: HookEngine, window: &Window, loader: Arc<dyn ScriptLoader>) -> Self {
        Self {
            engine,
            document: window.document().clone(),
            console: window.console().clone(),
            loader,
            started: AtomicBool::new(false),
        }
    }

    /// Run the scan as a window task: now if the document is parsed,
    /// otherwise once DOMContentLoaded fires
    pub fn schedule(self, window: &Window) {
        let scanner = Arc::new(self);

        if window.ready_state() >= ReadyState::Interactive {
            window.queue_task(async move {
                scanner.run().await;
            });
            return;
        }

        let queue = window.task_queue();
        window.add_event_listener(
            EventType::DomContentLoaded,
            Arc::new(move |_: &crate::window::Event| {
                let scanner = scanner.clone();
                queue.push(Box::pin(async move {
                    scanner.run().await;
                }));
                Ok(())
            }),
        );
    }

    /// Scan the document. Later calls return an empty report.
    pub async fn run(&self) -> ScanReport {
        let mut report = ScanReport::default();
        if self.started.swap(true, Ordering::SeqCst) {
            return report;
        }

        let scripts = self.document.scripts();

        for script in &scripts {
            let Some(src) = script.src().filter(|s| !s.trim().is_empty()) else {
                continue;
            };

            let loaded = match self.document.resolve_url(src.trim()) {
                Ok(url) => match self.loader.load(&url).await {
                    Ok(body) => Ok((url, body)),
                    Err(e) => Err(e),
                },
                Err(e) => Err(Error::script_fetch(src.as_str(), None, e.to_string())),
            };

            match loaded {
                Ok((url, body)) => {
                    report.external_scanned += 1;
                    report.reported += self.scan_body(&body, ContextTag::ScriptSource, url.as_str());
                }
                Err(e) => {
                    report.external_failed += 1;
                    self.console
                        .warn(format!("Error fetching script {}: {}", src, e));
                    tracing::warn!(src = %src, error = %e, "Script fetch failed, continuing scan");
                }
            }
        }

        let base = self
            .document
            .url_string()
            .unwrap_or_else(|| "about:blank".to_string());
        let inline = scripts.iter().filter(|s| !s.has_attribute("src"));
        for (index, script) in inline.enumerate() {
            report.inline_scanned += 1;
            let source = format!("{}#inline-{}", base, index);
            report.reported +=
                self.scan_body(&script.text_content(), ContextTag::InlineScript, &source);
        }

        tracing::info!(
            external = report.external_scanned,
            failed = report.external_failed,
            inline = report.inline_scanned,
            reported = report.reported,
            "Script scan finished"
        );
        report
    }

    fn scan_body(&self, body: &str, context: ContextTag, source: &str) -> usize {
        self.engine
            .matcher()
            .find_iter(body)
            .filter(|url| {
                self.engine.report_from(
                    Discovery::new(*url, context.clone(), *url),
                    Some(source.to_string()),
                )
            })
            .count()
    }
}

impl std::fmt::Debug for ScriptScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptScanner")
            .field("url", &self.document.url_string())
            .field("started", &self.started.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::NoAttributor;
    use crate::window::WindowConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_scan_skips_failed_scripts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken.js"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("const a = 'https://api.test/a'; const b = \"https://api.test/b\";"),
            )
            .mount(&server)
            .await;

        let html = r#"<html><head>
            <script src="/broken.js"></script>
            <script src="/app.js"></script>
            <script>track("https://metrics.test/hit")</script>
        </head><body></body></html>"#;
        let window = Window::from_html(html, WindowConfig::new().url(format!("{}/", server.uri()))).unwrap();
        let engine = HookEngine::builder().attributor(NoAttributor).build();
        let loader = Arc::new(
            HttpScriptLoader::new(window.client().clone()).with_network_log(window.network().clone()),
        );

        let scanner = ScriptScanner::new(engine.clone(), &window, loader);
        let report = scanner.run().await;

        assert_eq!(
            report,
            ScanReport {
                external_scanned: 1,
                external_failed: 1,
                inline_scanned: 1,
                reported: 3,
            }
        );
        assert_eq!(scanner.run().await, ScanReport::default());

        let app_url = format!("{}/app.js", server.uri());
        let sources: Vec<_> = engine.entries().into_iter().map(|e| e.source).collect();
        assert_eq!(sources[0], app_url);
        assert_eq!(sources[1], app_url);
        assert!(sources[2].ends_with("#inline-0"));

        let warnings = window.console().lines(crate::window::ConsoleLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("broken.js"));
        assert_eq!(window.network().records_by_kind(RequestKind::Script).len(), 2);
    }

    #[tokio::test]
    async fn test_load_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpScriptLoader::new(HttpClient::new().unwrap());
        let url = Url::parse(&format!("{}/gone.js", server.uri())).unwrap();
        let err = loader.load(&url).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().ends_with("HTTP 404 Not Found"));
    }
}
