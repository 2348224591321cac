//! Background data refresh system
//!
//! Provides automatic refresh of headlines and market data in the background
//! using tokio channels to communicate updates to the main application. The
//! refresh tasks live exactly as long as the handle: dropping or shutting it
//! down stops the timers.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::data::{CoinMarket, MarketsClient, NewsClient, NewsItem};

/// Messages sent from background refresh to the main application
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Fresh (or cache-served) headlines
    NewsUpdated(Vec<NewsItem>),
    /// Fresh market listing
    MarketsUpdated(Vec<CoinMarket>),
    /// An error occurred during refresh
    RefreshError(String),
    /// A refresh cycle started
    RefreshStarted,
    /// A refresh cycle completed
    RefreshCompleted,
}

/// Configuration for refresh intervals
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between headline refreshes
    pub news_interval: Duration,
    /// Interval between market data refreshes
    pub markets_interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            news_interval: Duration::from_secs(300),   // 5 minutes
            markets_interval: Duration::from_secs(60), // 1 minute
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh system
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Flag to signal shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the background refresh task and returns a handle to it.
    ///
    /// The headline timer calls `fetch_news(false)`, so within the cache TTL
    /// the tick is served from the cache without network activity. Overlapping
    /// fetches are not de-duplicated: a manual refresh racing a timer tick is
    /// fine because cache writes replace the entry wholesale and the last
    /// writer wins.
    pub fn spawn(config: RefreshConfig, news: NewsClient, markets: MarketsClient) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut news_interval = tokio::time::interval(config.news_interval);
                let mut markets_interval = tokio::time::interval(config.markets_interval);
                // Skip the first tick (immediate) for both timers; callers
                // fetch an initial snapshot themselves.
                news_interval.tick().await;
                markets_interval.tick().await;

                loop {
                    tokio::select! {
                        _ = news_interval.tick() => {
                            debug!("refreshing headlines");
                            let _ = msg_tx.send(RefreshMessage::RefreshStarted).await;
                            let items = news.fetch_news(false).await;
                            let _ = msg_tx.send(RefreshMessage::NewsUpdated(items)).await;
                            let _ = msg_tx.send(RefreshMessage::RefreshCompleted).await;
                        }
                        _ = markets_interval.tick() => {
                            debug!("refreshing markets");
                            match markets.fetch_markets().await {
                                Ok(coins) => {
                                    let _ = msg_tx.send(RefreshMessage::MarketsUpdated(coins)).await;
                                }
                                Err(err) => {
                                    let _ = msg_tx
                                        .send(RefreshMessage::RefreshError(err.to_string()))
                                        .await;
                                }
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("refresh task shutting down");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Shuts down the background refresh task.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for a pending refresh message without blocking.
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.news_interval, Duration::from_secs(300));
        assert_eq!(config.markets_interval, Duration::from_secs(60));
        assert!(config.enabled);
    }

    #[test]
    fn test_refresh_config_custom() {
        let config = RefreshConfig {
            news_interval: Duration::from_secs(60),
            markets_interval: Duration::from_secs(15),
            enabled: false,
        };
        assert_eq!(config.news_interval, Duration::from_secs(60));
        assert_eq!(config.markets_interval, Duration::from_secs(15));
        assert!(!config.enabled);
    }

    #[tokio::test]
    async fn test_refresh_handle_spawn_disabled() {
        let config = RefreshConfig {
            enabled: false,
            ..Default::default()
        };

        let mut handle = RefreshHandle::spawn(config, NewsClient::new(), MarketsClient::new());

        // With refresh disabled, there should be no messages.
        assert!(try_recv(&mut handle).is_none());
    }

    #[tokio::test]
    async fn test_shutdown_does_not_panic() {
        let config = RefreshConfig {
            enabled: false,
            ..Default::default()
        };
        let handle = RefreshHandle::spawn(config, NewsClient::new(), MarketsClient::new());
        handle.shutdown().await;
    }
}
