//! Tool builder and contract for ScrapeFlow

use crate::browser::{BackendKind, BrowserLauncher, ChromeLauncher, HttpLauncher, LaunchOptions};
use crate::cache::{CacheStats, ContentCache, DEFAULT_CACHE_TTL};
use crate::error::ScrapeError;
use crate::fetcher::{Fetcher, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT};
use crate::pipeline::ContentPipeline;
use crate::types::{SummarizeRequest, SummarizeResponse};
use crate::{TOOL_DESCRIPTION, TOOL_LLMTXT, TOOL_NAME};
use futures::FutureExt;
use schemars::schema_for;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Smallest navigation timeout the builder accepts
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Builder for configuring the ScrapeFlow tool
#[derive(Clone, Default)]
pub struct ToolBuilder {
    backend: BackendKind,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    chrome_executable: Option<PathBuf>,
    launch_options: LaunchOptions,
    timeout: Option<Duration>,
    settle_delay: Option<Duration>,
    cache_ttl: Option<Duration>,
    max_cache_entries: Option<usize>,
}

impl ToolBuilder {
    /// Create a new tool builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a built-in browser backend
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Use a custom launcher, overriding [`backend`](Self::backend)
    pub fn launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Path to the Chromium binary for the chrome backend
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_executable = Some(path.into());
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.launch_options.user_agent = ua.into();
        self
    }

    /// Set the browser viewport
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.launch_options.width = width;
        self.launch_options.height = height;
        self
    }

    /// Navigation timeout, at least one millisecond
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.max(MIN_TIMEOUT));
        self
    }

    /// Pause between DOMContentLoaded and reading the page
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    /// Lifetime of cached pages
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Bound the number of cached URLs
    pub fn max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = Some(max);
        self
    }

    /// Build the tool
    pub fn build(self) -> Tool {
        let launcher = match self.launcher {
            Some(launcher) => launcher,
            None => builtin_launcher(self.backend, self.chrome_executable),
        };

        let fetcher = Fetcher::new(launcher)
            .with_options(self.launch_options)
            .with_settle_delay(self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY));

        let ttl = self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        let cache = match self.max_cache_entries {
            Some(max) => ContentCache::bounded(ttl, max),
            None => ContentCache::new(ttl),
        };

        Tool {
            pipeline: Arc::new(ContentPipeline::new(fetcher, Arc::new(cache))),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

/// Configured ScrapeFlow tool
///
/// Cloning is cheap; clones share one cache.
#[derive(Clone)]
pub struct Tool {
    pipeline: Arc<ContentPipeline>,
    timeout: Duration,
}

impl Default for Tool {
    fn default() -> Self {
        ToolBuilder::new().build()
    }
}

impl Tool {
    /// Create a new tool builder
    pub fn builder() -> ToolBuilder {
        ToolBuilder::new()
    }

    /// Name the tool is registered under
    pub fn name(&self) -> &'static str {
        TOOL_NAME
    }

    /// Get tool description
    pub fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Get input schema as JSON
    pub fn input_schema(&self) -> serde_json::Value {
        let schema = schema_for!(SummarizeRequest);
        serde_json::to_value(schema).unwrap_or_default()
    }

    /// Navigation timeout applied to each fetch
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Name of the browser backend in use
    pub fn backend(&self) -> &'static str {
        self.pipeline.fetcher().backend()
    }

    /// Snapshot of the content cache
    pub fn cache_stats(&self) -> CacheStats {
        self.pipeline.cache().stats()
    }

    /// Drop every cached page
    pub fn clear_cache(&self) {
        self.pipeline.cache().clear();
    }

    /// Execute the tool with the given request
    ///
    /// Panics inside the pipeline are caught and returned as
    /// [`ScrapeError::Internal`].
    pub async fn execute(&self, req: SummarizeRequest) -> Result<SummarizeResponse, ScrapeError> {
        if req.url.is_empty() {
            return Err(ScrapeError::MissingUrl);
        }

        if !req.url.starts_with("http://") && !req.url.starts_with("https://") {
            return Err(ScrapeError::InvalidUrlScheme);
        }

        url::Url::parse(&req.url).map_err(|e| ScrapeError::MalformedUrl(e.to_string()))?;

        let text = AssertUnwindSafe(self.pipeline.get_clean_content(&req.url, self.timeout))
            .catch_unwind()
            .await
            .map_err(|panic| ScrapeError::Internal(panic_message(panic.as_ref())))??;

        Ok(SummarizeResponse::from_content(&req, &text))
    }

    /// Scrape `url` and return the text handed to the agent
    ///
    /// Never fails: every error is rendered into the returned string.
    pub async fn search_and_summarize(&self, req: SummarizeRequest) -> String {
        let url = req.url.clone();
        match self.execute(req).await {
            Ok(response) => response.render(),
            Err(e) => e.render(&url),
        }
    }
}

fn builtin_launcher(backend: BackendKind, chrome_executable: Option<PathBuf>) -> Arc<dyn BrowserLauncher> {
    match (backend, chrome_executable) {
        (BackendKind::Chrome, Some(path)) => Arc::new(ChromeLauncher::with_executable(path)),
        (BackendKind::Chrome, None) => Arc::new(ChromeLauncher::new()),
        (BackendKind::Http, _) => Arc::new(HttpLauncher::new()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal panic".to_string()
    }
}
