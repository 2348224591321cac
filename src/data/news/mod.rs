//! Resilient multi-source headline fetching
//!
//! Implements a waterfall over ordered news sources, each tried through an
//! ordered list of relay routes until one yields parseable headlines. The
//! first success is normalized, truncated, written to the cache, and
//! returned. Total exhaustion yields an empty list, never an error: a
//! degraded data source should degrade the display, not crash it.

mod normalize;
mod sources;
mod transport;

pub use normalize::{decode_html_entities, format_time_ago, strip_cdata};
pub use sources::{default_sources, ApiKeys, NewsSource, ParseError, Parser, Route};
pub use transport::{ReqwestTransport, Transport, TransportError, REQUEST_TIMEOUT};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::NewsCache;
use crate::clock::{Clock, SystemClock};
use crate::data::NewsItem;

/// Maximum number of headlines kept from a successful fetch
pub const MAX_ITEMS: usize = 6;

/// Client for fetching crypto headlines with caching and fallback.
#[derive(Clone)]
pub struct NewsClient {
    transport: Arc<dyn Transport>,
    cache: NewsCache,
    clock: Arc<dyn Clock>,
    sources: Vec<NewsSource>,
}

impl Default for NewsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsClient {
    /// Creates a client with the default transport, source list, and a cache
    /// in the XDG cache directory.
    ///
    /// Falls back to an in-memory cache when no cache directory is available;
    /// the cache is an optimization the client can run without.
    pub fn new() -> Self {
        let cache = NewsCache::new().unwrap_or_else(NewsCache::in_memory);
        Self::with_parts(
            Arc::new(ReqwestTransport::new()),
            cache,
            Arc::new(SystemClock),
            default_sources(&ApiKeys::from_env()),
        )
    }

    /// Creates a client from explicit parts.
    ///
    /// Tests use this to inject a scripted transport, an in-memory cache, a
    /// fixed clock, and a custom source list.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        cache: NewsCache,
        clock: Arc<dyn Clock>,
        sources: Vec<NewsSource>,
    ) -> Self {
        Self {
            transport,
            cache,
            clock,
            sources,
        }
    }

    /// Returns the cache backing this client.
    pub fn cache(&self) -> &NewsCache {
        &self.cache
    }

    /// Fetches the current headlines.
    ///
    /// With `force_refresh` false and a valid cache entry, the cached batch
    /// is returned with no network activity. Otherwise sources are tried in
    /// priority order, each over its routes in order, and the first source to
    /// yield at least one normalized item wins: its items are cached and
    /// returned. If every source is exhausted the result is empty and the
    /// cache is left untouched, so a stale batch remains readable.
    ///
    /// This method never returns an error; route failures, malformed bodies,
    /// and storage failures are all absorbed.
    pub async fn fetch_news(&self, force_refresh: bool) -> Vec<NewsItem> {
        if !force_refresh && self.cache.is_valid() {
            let cached = self.cache.read();
            if !cached.is_empty() {
                debug!(count = cached.len(), "using cached headlines");
                return cached;
            }
        }

        debug!("fetching fresh headlines");
        for source in &self.sources {
            if let Some(items) = self.try_source(source).await {
                self.cache.write(&items, source.label);
                info!(source = source.label, count = items.len(), "headlines fetched");
                return items;
            }
        }

        warn!("all headline sources failed");
        Vec::new()
    }

    /// Tries every route for one source, returning the first non-empty batch.
    async fn try_source(&self, source: &NewsSource) -> Option<Vec<NewsItem>> {
        for route in &source.routes {
            let url = route.request_url(&source.url);

            let body = match self.transport.get(&url).await {
                Ok(body) => body,
                Err(err) => {
                    debug!(source = source.label, route = route.label(), %err, "route failed");
                    continue;
                }
            };

            let body = match route.unwrap_body(body) {
                Ok(body) => body,
                Err(err) => {
                    debug!(source = source.label, route = route.label(), %err, "bad relay envelope");
                    continue;
                }
            };

            let mut items = match (source.parser)(&body, self.clock.now()) {
                Ok(items) => items,
                Err(err) => {
                    debug!(source = source.label, route = route.label(), %err, "unparseable response");
                    continue;
                }
            };

            if items.is_empty() {
                debug!(source = source.label, route = route.label(), "response had no items");
                continue;
            }

            items.truncate(MAX_ITEMS);
            return Some(items);
        }

        debug!(source = source.label, "source exhausted");
        None
    }
}
