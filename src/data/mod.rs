//! Core data models for coinpulse
//!
//! This module contains the data types used throughout the application for
//! representing crypto headlines and market listings, along with the clients
//! that produce them.

pub mod markets;
pub mod news;

pub use markets::{MarketsClient, MarketsError};
pub use news::NewsClient;

use serde::{Deserialize, Serialize};

/// A single normalized headline ready for display
///
/// Every field is always present: raw items that cannot be normalized into
/// this shape are dropped rather than padded with placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline text, HTML-entity-decoded
    pub title: String,
    /// Human-readable publication name
    pub source: String,
    /// Relative age string, e.g. "5m ago", computed at normalization time
    pub time: String,
    /// Link to the original article
    pub url: String,
}

/// One coin row from the markets listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinMarket {
    /// Uppercased ticker symbol
    pub symbol: String,
    /// Coin name
    pub name: String,
    /// Current price in USD
    pub price: f64,
    /// Price change over the last 24 hours, in percent
    pub change_24h: f64,
    /// Market capitalization in USD
    pub market_cap: f64,
    /// Trading volume over the last 24 hours in USD
    pub volume_24h: f64,
}
