//! Core types for ScrapeFlow

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of characters returned to the agent
pub const DEFAULT_MAX_CHARS: usize = 5000;

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_include_metadata() -> bool {
    true
}

/// Request to scrape and summarize a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummarizeRequest {
    /// The URL to scrape (required, must be http:// or https://)
    pub url: String,

    /// Maximum number of characters of page text to return (default 5000)
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Prepend a line with the source URL and character counts (default true)
    #[serde(default = "default_include_metadata")]
    pub include_metadata: bool,
}

impl Default for SummarizeRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_chars: DEFAULT_MAX_CHARS,
            include_metadata: true,
        }
    }
}

impl SummarizeRequest {
    /// Create a new request with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the character limit
    pub fn max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Enable or disable the metadata header
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

/// Cleaned page text, truncated for the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SummarizeResponse {
    /// The scraped URL
    pub url: String,

    /// Length of the full cleaned text, in characters
    pub total_chars: usize,

    /// Length of `content`, in characters
    pub shown_chars: usize,

    /// Cleaned text, cut at `max_chars`
    pub content: String,

    /// Whether [`render`](Self::render) prepends the metadata line
    pub include_metadata: bool,
}

impl SummarizeResponse {
    /// Build a response from the full cleaned text
    ///
    /// Truncation counts characters, not bytes, and ignores word boundaries.
    pub fn from_content(request: &SummarizeRequest, text: &str) -> Self {
        let total_chars = text.chars().count();
        let content: String = text.chars().take(request.max_chars).collect();
        let shown_chars = total_chars.min(request.max_chars);

        Self {
            url: request.url.clone(),
            total_chars,
            shown_chars,
            content,
            include_metadata: request.include_metadata,
        }
    }

    /// True if the content was cut short
    pub fn is_truncated(&self) -> bool {
        self.shown_chars < self.total_chars
    }

    /// Format the response as the single string handed to the agent
    pub fn render(&self) -> String {
        if self.include_metadata {
            format!(
                "Content from {} (Total: {} chars, Showing: {} chars)\n\n{}",
                self.url, self.total_chars, self.shown_chars, self.content
            )
        } else {
            self.content.clone()
        }
    }
}
