//! Plain HTTP backend
//!
//! Fetches the raw document with a single GET. No JavaScript runs, so pages
//! that render client-side come back mostly empty; useful on hosts without
//! a Chromium install.

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::error::ScrapeError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// Upper bound for a single request; the fetcher usually cuts in earlier
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP launcher
#[derive(Debug, Clone, Default)]
pub struct HttpLauncher;

impl HttpLauncher {
    /// Create a new HTTP launcher
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScrapeError::BrowserLaunch(e.to_string()))?;

        Ok(Box::new(HttpSession { client, body: None }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    body: Option<String>,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::from_reqwest(e, REQUEST_TIMEOUT))?;

        // Like a browser, error pages still render
        debug!(status = response.status().as_u16(), url, "HTTP response");

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::ContentRead(e.to_string()))?;
        self.body = Some(body);
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        self.body
            .clone()
            .ok_or_else(|| ScrapeError::ContentRead("No page has been loaded".to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        Ok(())
    }
}
