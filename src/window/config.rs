// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Window configuration

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, DEFAULT_USER_AGENT};

/// Window configuration
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Document URL. `None` gives an `about:blank`-like window with no base URL.
    pub url: Option<String>,
    pub user_agent: String,
    /// Timeout for network requests made by the window
    pub timeout: Duration,
    /// Accept invalid TLS certificates
    pub ignore_https_errors: bool,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Cap on retained network records
    pub max_network_records: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            ignore_https_errors: false,
            proxy: None,
            max_network_records: 10_000,
        }
    }
}

impl WindowConfig {
    /// Create a new window config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ignore HTTPS errors
    pub fn ignore_https_errors(mut self, ignore: bool) -> Self {
        self.ignore_https_errors = ignore;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Config for auditing a third-party page
    pub fn for_auditing() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            ignore_https_errors: true,
            ..Default::default()
        }
    }

    /// Parsed document URL
    pub fn parsed_url(&self) -> Result<Option<Url>> {
        self.url
            .as_deref()
            .map(|u| {
                Url::parse(u).map_err(|e| Error::Config(format!("Invalid window URL '{}': {}", u, e)))
            })
            .transpose()
    }

    pub(crate) fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
            accept_invalid_certs: self.ignore_https_errors,
            proxy: self.proxy.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = WindowConfig::new()
            .url("https://app.test/")
            .timeout(Duration::from_secs(5))
            .user_agent("urlhook-test");

        assert_eq!(config.parsed_url().unwrap().unwrap().host_str(), Some("app.test"));
        let http = config.http_config();
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.user_agent, "urlhook-test");
    }

    #[test]
    fn test_invalid_url() {
        let config = WindowConfig::new().url("not a url");
        assert!(matches!(config.parsed_url(), Err(Error::Config(_))));
        assert!(WindowConfig::default().parsed_url().unwrap().is_none());
    }
}
