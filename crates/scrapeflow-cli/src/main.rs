//! ScrapeFlow CLI - MCP server and one-shot page scraping

mod mcp;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scrapeflow::{BackendKind, SummarizeRequest, Tool, DEFAULT_MAX_CHARS, TOOL_LLMTXT};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Browser backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Headless Chromium (runs page JavaScript)
    #[default]
    Chrome,
    /// Plain HTTP GET (no JavaScript)
    Http,
}

impl From<Backend> for BackendKind {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Chrome => BackendKind::Chrome,
            Backend::Http => BackendKind::Http,
        }
    }
}

/// ScrapeFlow - headless-browser scraping tool for LLM agents
#[derive(Parser, Debug)]
#[command(name = "scrapeflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    #[command(flatten)]
    tool: ToolArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct ToolArgs {
    /// Browser backend used to load pages
    #[arg(long, global = true, value_enum, default_value_t = Backend::Chrome)]
    backend: Backend,

    /// Path to the Chromium/Chrome binary
    #[arg(long, global = true)]
    chrome_path: Option<PathBuf>,

    /// Navigation timeout in milliseconds
    #[arg(long, global = true, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Pause after page load before reading content, in milliseconds
    #[arg(long, global = true, default_value_t = 2_000)]
    settle_ms: u64,

    /// Lifetime of cached pages in seconds
    #[arg(long, global = true, default_value_t = 600)]
    cache_ttl_secs: u64,

    /// Maximum number of cached pages (unbounded if omitted)
    #[arg(long, global = true)]
    max_cache_entries: Option<usize>,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

impl ToolArgs {
    fn build_tool(&self) -> Tool {
        let mut builder = Tool::builder()
            .backend(self.backend.into())
            .timeout(Duration::from_millis(self.timeout_ms))
            .settle_delay(Duration::from_millis(self.settle_ms))
            .cache_ttl(Duration::from_secs(self.cache_ttl_secs));

        if let Some(ref path) = self.chrome_path {
            builder = builder.chrome_executable(path.clone());
        }
        if let Some(max) = self.max_cache_entries {
            builder = builder.max_cache_entries(max);
        }
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }

        builder.build()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Scrape a URL once and print the cleaned text
    Fetch {
        /// URL to scrape
        url: String,

        /// Maximum characters of text to print
        #[arg(long, default_value_t = DEFAULT_MAX_CHARS)]
        max_chars: usize,

        /// Omit the "Content from ..." header line
        #[arg(long)]
        no_metadata: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries MCP frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    let tool = cli.tool.build_tool();
    tracing::debug!(backend = tool.backend(), "Tool configured");

    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server(tool).await;
        }
        Some(Commands::Fetch {
            url,
            max_chars,
            no_metadata,
        }) => {
            let request = SummarizeRequest::new(url)
                .max_chars(max_chars)
                .include_metadata(!no_metadata);
            writeln_safe(&tool.search_and_summarize(request).await);
        }
        None => {
            eprintln!("Usage: scrapeflow fetch <URL>");
            eprintln!("   or: scrapeflow mcp");
            eprintln!("   or: scrapeflow --help");
            std::process::exit(1);
        }
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
