//! Error types for ScrapeFlow

use std::time::Duration;
use thiserror::Error;

/// Prefix every scraping failure starts with once rendered for the agent
pub const SCRAPING_ERROR_PREFIX: &str = "Scraping Error:";

/// Remediation hint appended to rendered scraping failures
pub const SCRAPING_ERROR_HINT: &str =
    "The site may be using anti-bot protection or blocking automated browsers.";

/// Coarse classification of a [`ScrapeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any I/O
    Validation,
    /// Browser or network failure while loading the page
    Scraping,
    /// Anything else surfacing through the tool boundary
    Unexpected,
}

/// Errors that can occur while fetching and cleaning a page
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// URL is missing
    #[error("Missing required parameter: url")]
    MissingUrl,

    /// URL has invalid scheme
    #[error("Invalid URL: must start with http:// or https://")]
    InvalidUrlScheme,

    /// URL has the right scheme but does not parse
    #[error("Invalid URL: {0}")]
    MalformedUrl(String),

    /// Browser process or HTTP client could not be started
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// Page did not reach DOMContentLoaded in time
    #[error("Navigation timed out after {} ms", .0.as_millis())]
    NavigationTimeout(Duration),

    /// DNS failure, refused connection, protocol error
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Page loaded but its HTML could not be read back
    #[error("Failed to read page content: {0}")]
    ContentRead(String),

    /// Panic or invariant violation inside the pipeline
    #[error("{0}")]
    Internal(String),
}

impl ScrapeError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ScrapeError::NavigationTimeout(timeout)
        } else if err.is_connect() {
            ScrapeError::Navigation(format!("Failed to connect to server: {}", err))
        } else {
            ScrapeError::Navigation(err.to_string())
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::MissingUrl
            | ScrapeError::InvalidUrlScheme
            | ScrapeError::MalformedUrl(_) => ErrorKind::Validation,
            ScrapeError::NavigationTimeout(_)
            | ScrapeError::Navigation(_)
            | ScrapeError::ContentRead(_) => ErrorKind::Scraping,
            ScrapeError::BrowserLaunch(_) | ScrapeError::Internal(_) => ErrorKind::Unexpected,
        }
    }

    /// Render the error as the text handed back to the agent
    pub fn render(&self, url: &str) -> String {
        match self.kind() {
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Scraping => {
                format!("{} {}. {}", SCRAPING_ERROR_PREFIX, self, SCRAPING_ERROR_HINT)
            }
            ErrorKind::Unexpected => {
                format!("Unexpected error while processing {}: {}", url, self)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ScrapeError::MissingUrl.to_string(),
            "Missing required parameter: url"
        );
        assert_eq!(
            ScrapeError::InvalidUrlScheme.to_string(),
            "Invalid URL: must start with http:// or https://"
        );
        assert_eq!(
            ScrapeError::NavigationTimeout(Duration::from_secs(30)).to_string(),
            "Navigation timed out after 30000 ms"
        );
        assert_eq!(
            ScrapeError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()).to_string(),
            "Navigation failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ScrapeError::MissingUrl.kind(), ErrorKind::Validation);
        assert_eq!(ScrapeError::InvalidUrlScheme.kind(), ErrorKind::Validation);
        assert_eq!(
            ScrapeError::NavigationTimeout(Duration::from_millis(10)).kind(),
            ErrorKind::Scraping
        );
        assert_eq!(
            ScrapeError::ContentRead("detached".to_string()).kind(),
            ErrorKind::Scraping
        );
        assert_eq!(
            ScrapeError::BrowserLaunch("no chrome".to_string()).kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            ScrapeError::Internal("boom".to_string()).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_render_scraping_error() {
        let err = ScrapeError::Navigation("connection refused".to_string());
        let text = err.render("https://example.com");
        assert!(text.starts_with(SCRAPING_ERROR_PREFIX));
        assert!(text.contains("connection refused"));
        assert!(text.ends_with(SCRAPING_ERROR_HINT));
    }

    #[test]
    fn test_render_validation_error() {
        let text = ScrapeError::InvalidUrlScheme.render("ftp://example.com");
        assert_eq!(text, "Invalid URL: must start with http:// or https://");
    }

    #[test]
    fn test_render_malformed_url() {
        let err = ScrapeError::MalformedUrl("empty host".to_string());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.render("https://"), "Invalid URL: empty host");
    }

    #[test]
    fn test_render_unexpected_error() {
        let err = ScrapeError::BrowserLaunch("chrome not found".to_string());
        assert_eq!(
            err.render("https://example.com"),
            "Unexpected error while processing https://example.com: Failed to launch browser: chrome not found"
        );
    }
}
