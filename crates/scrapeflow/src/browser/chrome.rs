//! Headless Chromium backend
//!
//! Launches a dedicated Chromium process per session and drives it over the
//! DevTools protocol. Each session gets its own throwaway profile directory,
//! so cookies and storage never leak between fetches. The process is shut
//! down in [`BrowserSession::close`]; if the session is dropped instead
//! (panic, cancelled future) chromiumoxide kills the child process on drop
//! and the profile directory is removed with it.

use crate::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::error::ScrapeError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long a graceful browser shutdown may take before the process is killed
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Chromium launcher
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
}

impl ChromeLauncher {
    /// Create a launcher that locates Chromium automatically
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific Chromium/Chrome binary
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(executable.into()),
        }
    }

    fn config(
        &self,
        options: &LaunchOptions,
        profile_dir: &Path,
    ) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile_dir)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", options.user_agent))
            .window_size(options.width, options.height)
            .viewport(Viewport {
                width: options.width,
                height: options.height,
                ..Default::default()
            });

        if let Some(ref path) = self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(ScrapeError::BrowserLaunch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let profile = tempfile::Builder::new()
            .prefix("scrapeflow-profile-")
            .tempdir()
            .map_err(|e| {
                ScrapeError::BrowserLaunch(format!("Failed to create profile directory: {}", e))
            })?;
        let config = self.config(options, profile.path())?;

        info!(profile = %profile.path().display(), "Launching headless Chromium");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::BrowserLaunch(e.to_string()))?;

        // The CDP handler must be polled for the browser to make progress
        let handler_task = tokio::spawn(async move {
            drive_handler(&mut handler).await;
        });

        let mut session = ChromeSession {
            browser,
            handler_task,
            page: None,
            profile,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                session.shutdown().await;
                Err(ScrapeError::BrowserLaunch(format!(
                    "Failed to create browser page: {}",
                    e
                )))
            }
        }
    }
}

/// Poll the CDP handler until the connection closes
///
/// Individual errors (e.g. a frame chromiumoxide cannot deserialize) are
/// logged and skipped; the handler keeps serving the remaining traffic.
/// Returns the number of events seen.
async fn drive_handler<S, E>(handler: &mut S) -> usize
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: Display,
{
    let mut seen = 0;
    while let Some(event) = handler.next().await {
        seen += 1;
        if let Err(e) = event {
            debug!("CDP handler error: {}", e);
        }
    }
    debug!("CDP connection closed");
    seen
}

// Field order matters: the browser is dropped (and killed) before its
// profile directory is removed.
struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    profile: TempDir,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::Internal("Browser page is not open".to_string()))
    }

    async fn shutdown(&mut self) -> Option<String> {
        let failure = match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.close_gracefully()).await {
            Ok(failure) => failure,
            Err(_) => {
                warn!(
                    timeout_ms = SHUTDOWN_TIMEOUT.as_millis() as u64,
                    "Browser did not shut down in time, killing it"
                );
                match self.browser.kill().await {
                    Some(Err(e)) => Some(format!("Failed to kill browser: {}", e)),
                    _ => Some("Browser shutdown timed out".to_string()),
                }
            }
        };
        self.handler_task.abort();

        debug!(profile = %self.profile.path().display(), "Browser session shut down");
        failure
    }

    async fn close_gracefully(&mut self) -> Option<String> {
        let mut failure = None;

        if let Err(e) = self.browser.close().await {
            warn!("Error closing browser: {}", e);
            failure = Some(e.to_string());
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Error waiting for browser process: {}", e);
            failure.get_or_insert_with(|| e.to_string());
        }

        failure
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let page = self.page()?;

        // Subscribe before navigating so the event cannot be missed
        let mut dom_ready = page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

        let response = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

        if let Some(ref error_text) = response.result.error_text {
            return Err(ScrapeError::Navigation(error_text.clone()));
        }

        match dom_ready.next().await {
            Some(_) => Ok(()),
            None => Err(ScrapeError::Navigation(
                "Browser closed before the page finished loading".to_string(),
            )),
        }
    }

    async fn content(&mut self) -> Result<String, ScrapeError> {
        self.page()?
            .content()
            .await
            .map_err(|e| ScrapeError::ContentRead(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
        let mut session = self;
        if let Some(page) = session.page.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, page.close()).await {
                Ok(Err(e)) => debug!("Error closing page: {}", e),
                Err(_) => debug!("Timed out closing page"),
                Ok(Ok(())) => {}
            }
        }

        match session.shutdown().await {
            None => Ok(()),
            Some(message) => Err(ScrapeError::Internal(message)),
        }
    }
}
