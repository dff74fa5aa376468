//! ScrapeFlow - headless-browser page scraping for LLM agents
//!
//! This crate loads a web page in a browser, strips non-content markup and
//! returns the remaining text, with a short-lived in-memory cache in front.
//!
//! ## Pipeline
//!
//! [`Tool`] validates the request and hands it to a [`ContentPipeline`]:
//! cache lookup, then on a miss [`Fetcher`] loads the page through a
//! [`BrowserLauncher`], [`clean_html`] reduces it to text, and the result is
//! stored in the [`ContentCache`].
//!
//! Built-in backends:
//! - [`ChromeLauncher`] - headless Chromium, runs page JavaScript
//! - [`HttpLauncher`] - plain HTTP GET, no JavaScript

pub mod browser;
mod cache;
mod clean;
mod error;
mod fetcher;
mod pipeline;
mod tool;
mod types;

pub use browser::{
    BackendKind, BrowserLauncher, BrowserSession, ChromeLauncher, HttpLauncher, LaunchOptions,
};
pub use cache::{CacheStats, ContentCache, DEFAULT_CACHE_TTL};
pub use clean::{clean_html, normalize_lines, STRIPPED_TAGS};
pub use error::{ErrorKind, ScrapeError, SCRAPING_ERROR_HINT, SCRAPING_ERROR_PREFIX};
pub use fetcher::{Fetcher, DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT};
pub use pipeline::ContentPipeline;
pub use tool::{Tool, ToolBuilder};
pub use types::{SummarizeRequest, SummarizeResponse, DEFAULT_MAX_CHARS};

/// Default User-Agent string, a current desktop Chrome
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Name the tool is registered under
pub const TOOL_NAME: &str = "search_and_summarize";

/// Tool description for LLM consumption
pub const TOOL_DESCRIPTION: &str = r#"Scrapes a specific URL and returns a cleaned summary of the content.
Useful for providing real-time web context to the LLM.

- Renders the page in a headless browser (JavaScript runs)
- Removes scripts, styles, navigation, headers, footers and sidebars
- Prefers the main content region of the page
- Results are cached for a few minutes"#;

/// Extended documentation for LLM consumption (llmtxt)
pub const TOOL_LLMTXT: &str = r#"# ScrapeFlow Tool

Scrapes a specific URL and returns a cleaned summary of the content.

## Capabilities
- Headless browser rendering with a desktop user agent
- Removal of non-content markup (script, style, nav, footer, header, aside, iframe, noscript)
- Content region selection: <main>, then <article>, then <body>
- Blank-line removal, one text block per line
- In-memory cache (10 minutes by default)

## Input Parameters
- `url` (required): The URL to scrape (must be http:// or https://)
- `max_chars` (optional): Maximum characters of text to return (default: 5000)
- `include_metadata` (optional): Prepend source and length line (default: true)

## Output
A single string. With metadata enabled it starts with:

    Content from {url} (Total: {N} chars, Showing: {M} chars)

followed by a blank line and the page text.

## Examples

### Scrape a page
```json
{"url": "https://example.com"}
```

### First 500 characters, text only
```json
{"url": "https://example.com", "max_chars": 500, "include_metadata": false}
```

## Error Handling
- Invalid URLs return "Invalid URL: must start with http:// or https://"
- Load failures return text starting with "Scraping Error:" and a hint that the site may block automated browsers
- Other failures return "Unexpected error while processing {url}: ..."
"#;
