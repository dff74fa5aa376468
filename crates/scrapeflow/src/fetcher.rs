//! Page fetcher
//!
//! Loads a URL in a fresh browser session and returns the rendered HTML.

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::error::ScrapeError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default navigation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause after DOMContentLoaded so client-side rendering can fill the DOM
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Drives a [`BrowserLauncher`] through one page load per call
pub struct Fetcher {
    launcher: Arc<dyn BrowserLauncher>,
    options: LaunchOptions,
    settle_delay: Duration,
}

impl Fetcher {
    /// Create a fetcher with default launch options and settle delay
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            options: LaunchOptions::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Set launch options
    pub fn with_options(mut self, options: LaunchOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the post-load settle delay
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Name of the underlying backend
    pub fn backend(&self) -> &'static str {
        self.launcher.name()
    }

    /// Fetch the rendered HTML of `url`
    ///
    /// `timeout` bounds the navigation only. The session is closed whether
    /// or not the load succeeds; a close failure is logged and does not
    /// mask the load result.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, ScrapeError> {
        if url.is_empty() {
            return Err(ScrapeError::MissingUrl);
        }

        let mut session = self.launcher.launch(&self.options).await?;
        info!(backend = self.launcher.name(), url, "Loading page");

        let result = self.load(session.as_mut(), url, timeout).await;

        if let Err(e) = session.close().await {
            warn!(url, "Failed to release browser session: {}", e);
        }

        result
    }

    async fn load(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        timeout: Duration,
    ) -> Result<String, ScrapeError> {
        tokio::time::timeout(timeout, session.navigate(url))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout(timeout))??;

        if !self.settle_delay.is_zero() {
            debug!(delay_ms = self.settle_delay.as_millis() as u64, "Waiting for page to settle");
            tokio::time::sleep(self.settle_delay).await;
        }

        session.content().await
    }
}
