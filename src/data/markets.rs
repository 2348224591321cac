//! CoinGecko markets API client
//!
//! Fetches the top coins by market capitalization and maps them into our
//! [`CoinMarket`] rows.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::CoinMarket;

/// Base URL for the CoinGecko markets endpoint
const COINGECKO_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";

/// How many coins to request
const LISTING_SIZE: u32 = 10;

/// Errors that can occur when fetching market data
#[derive(Debug, Error)]
pub enum MarketsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for fetching coin listings from the CoinGecko API
#[derive(Debug, Clone)]
pub struct MarketsClient {
    client: Client,
    base_url: String,
}

impl Default for MarketsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketsClient {
    /// Creates a new MarketsClient with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: COINGECKO_MARKETS_URL.to_string(),
        }
    }

    /// Fetches the top coins by market cap, priced in USD.
    ///
    /// Unlike the headline fetcher this client has no cache or fallback
    /// chain; callers render the market section independently and show an
    /// unavailable state on error.
    pub async fn fetch_markets(&self) -> Result<Vec<CoinMarket>, MarketsError> {
        let url = format!(
            "{}?vs_currency=usd&order=market_cap_desc&per_page={}&page=1&sparkline=false&price_change_percentage=24h",
            self.base_url, LISTING_SIZE
        );

        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        let records: Vec<CoinGeckoMarket> = serde_json::from_str(&text)?;

        Ok(records.into_iter().map(CoinMarket::from).collect())
    }
}

/// One coin record from the CoinGecko API
#[derive(Debug, Deserialize)]
struct CoinGeckoMarket {
    symbol: String,
    name: String,
    current_price: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
}

impl From<CoinGeckoMarket> for CoinMarket {
    fn from(coin: CoinGeckoMarket) -> Self {
        Self {
            symbol: coin.symbol.to_uppercase(),
            name: coin.name,
            price: coin.current_price.unwrap_or(0.0),
            change_24h: coin.price_change_percentage_24h.unwrap_or(0.0),
            market_cap: coin.market_cap.unwrap_or(0.0),
            volume_24h: coin.total_volume.unwrap_or(0.0),
        }
    }
}
