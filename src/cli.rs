//! Command-line interface parsing for coinpulse
//!
//! This module defines the clap command tree: one-shot views for headlines
//! and markets, cache inspection, and a watch mode that keeps refreshing.

use clap::{Parser, Subcommand};

/// Coinpulse - crypto market data and headlines in your terminal
#[derive(Parser, Debug)]
#[command(name = "coinpulse")]
#[command(about = "Crypto market data and headlines in your terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Show current crypto headlines
    News {
        /// Bypass the cache and fetch fresh headlines
        #[arg(long)]
        refresh: bool,
    },
    /// Show the top coins by market cap
    Markets,
    /// Inspect or clear the local headline cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Keep fetching and printing updates on an interval
    Watch {
        /// Seconds between headline refreshes
        #[arg(long, default_value_t = 300)]
        news_interval: u64,
        /// Seconds between market refreshes
        #[arg(long, default_value_t = 60)]
        markets_interval: u64,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheAction {
    /// Print cache freshness, age, and entry count
    Info,
    /// Delete the cached headlines
    Clear,
}
