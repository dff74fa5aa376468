//! Browser backends for rendering pages
//!
//! Design: a [`BrowserLauncher`] opens one isolated [`BrowserSession`] per
//! fetch. The session is used for a single navigation and closed by the
//! caller on every exit path, so no browser state is shared between calls.

mod chrome;
mod http;

pub use chrome::ChromeLauncher;
pub use http::HttpLauncher;

use crate::error::ScrapeError;
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Settings applied to every session a launcher opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// User-Agent presented to the site
    pub user_agent: String,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            width: 1920,
            height: 1080,
        }
    }
}

/// Opens isolated browsing sessions
///
/// Implement this trait to plug in a different rendering engine. Tests use
/// it to substitute fakes for the real browser.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Unique identifier for this backend (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Start a fresh session
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

/// A single-use browsing context
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`, returning once the DOM content has loaded
    ///
    /// Does not apply a timeout of its own; the fetcher bounds this call.
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Serialized HTML of the current document
    async fn content(&mut self) -> Result<String, ScrapeError>;

    /// Release the session and everything it holds
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}

/// Built-in backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Headless Chromium over the DevTools protocol
    #[default]
    Chrome,
    /// Plain HTTP GET, no JavaScript
    Http,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BackendKind::Chrome),
            "http" => Ok(BackendKind::Http),
            _ => Err("Invalid backend: must be chrome or http".to_string()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Chrome => write!(f, "chrome"),
            BackendKind::Http => write!(f, "http"),
        }
    }
}
