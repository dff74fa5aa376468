//! Fetch, clean and cache pipeline
//!
//! Cache lookup first; on a miss the page is loaded, cleaned and stored.
//! Concurrent misses for the same URL wait on a per-URL lock so only one
//! of them drives the browser.

use crate::cache::ContentCache;
use crate::clean::clean_html;
use crate::error::ScrapeError;
use crate::fetcher::Fetcher;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Orchestrates [`Fetcher`], [`clean_html`] and [`ContentCache`]
pub struct ContentPipeline {
    fetcher: Fetcher,
    cache: Arc<ContentCache>,
    in_flight: Mutex<HashMap<String, KeyLock>>,
}

impl ContentPipeline {
    /// Create a pipeline around an existing cache
    pub fn new(fetcher: Fetcher, cache: Arc<ContentCache>) -> Self {
        Self {
            fetcher,
            cache,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the cache
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// The fetcher used on cache misses
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Get cleaned text for `url`, from cache when fresh
    ///
    /// Failed loads are returned as errors and never cached.
    pub async fn get_clean_content(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<String, ScrapeError> {
        if let Some(content) = self.cache.get(url) {
            debug!(url, "Cache hit");
            return Ok(content);
        }

        // Released on drop, so panics and cancelled callers clean up too
        let slot = self.claim_slot(url);
        let _guard = slot.lock.lock().await;

        // Another caller may have filled the cache while we waited
        if let Some(content) = self.cache.get(url) {
            debug!(url, "Cache filled by concurrent request");
            return Ok(content);
        }

        self.fetch_and_store(url, timeout).await
    }

    async fn fetch_and_store(&self, url: &str, timeout: Duration) -> Result<String, ScrapeError> {
        debug!(url, "Cache miss");

        let html = self.fetcher.fetch(url, timeout).await.map_err(|e| {
            warn!(url, "Scrape failed: {}", e);
            e
        })?;

        let text = clean_html(&html);
        self.cache.put(url, text.clone());
        Ok(text)
    }

    fn claim_slot<'a>(&'a self, url: &'a str) -> InFlightSlot<'a> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = in_flight.entry(url.to_string()).or_default().clone();
        InFlightSlot {
            in_flight: &self.in_flight,
            url,
            lock,
        }
    }

    /// URLs with a load currently in progress or queued
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Caller's claim on a per-URL lock; drops the map entry once unused
struct InFlightSlot<'a> {
    in_flight: &'a Mutex<HashMap<String, KeyLock>>,
    url: &'a str,
    lock: KeyLock,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one held here: nobody else is waiting
        if Arc::strong_count(&self.lock) <= 2 {
            in_flight.remove(self.url);
        }
    }
}
