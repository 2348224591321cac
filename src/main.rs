//! Coinpulse - view crypto market data and headlines from the terminal
//!
//! A command-line application that prints the current coin listing and the
//! latest crypto headlines, served from a local timed cache backed by a
//! waterfall of public news sources.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use coinpulse::cache::NewsCache;
use coinpulse::cli::{CacheAction, Cli, Command};
use coinpulse::data::{CoinMarket, MarketsClient, NewsClient, NewsItem};
use coinpulse::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};

#[tokio::main]
async fn main() {
    // Logs go to stderr so piped output stays clean; enable with RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::News { refresh } => run_news(refresh).await,
        Command::Markets => run_markets().await,
        Command::Cache { action } => run_cache(action),
        Command::Watch {
            news_interval,
            markets_interval,
        } => run_watch(news_interval, markets_interval).await,
    }
}

async fn run_news(force_refresh: bool) {
    let client = NewsClient::new();
    let items = client.fetch_news(force_refresh).await;
    print_news(&items);
}

async fn run_markets() {
    let client = MarketsClient::new();
    match client.fetch_markets().await {
        Ok(coins) => print_markets(&coins),
        Err(err) => eprintln!("Market data unavailable: {}", err),
    }
}

fn run_cache(action: CacheAction) {
    let Some(cache) = NewsCache::new() else {
        eprintln!("No cache directory available on this system.");
        return;
    };

    match action {
        CacheAction::Info => {
            let info = cache.info();
            println!("valid:   {}", info.is_valid);
            println!("age:     {} minutes", info.age_minutes);
            println!("entries: {}", info.count);
            println!("source:  {}", info.source);
        }
        CacheAction::Clear => {
            cache.clear();
            println!("Cache cleared.");
        }
    }
}

async fn run_watch(news_interval: u64, markets_interval: u64) {
    let news = NewsClient::new();
    let markets = MarketsClient::new();

    // Initial snapshot before the timers take over. The sections render
    // independently: a market failure does not block headlines.
    print_news(&news.fetch_news(false).await);
    match markets.fetch_markets().await {
        Ok(coins) => print_markets(&coins),
        Err(err) => eprintln!("Market data unavailable: {}", err),
    }

    let config = RefreshConfig {
        news_interval: std::time::Duration::from_secs(news_interval),
        markets_interval: std::time::Duration::from_secs(markets_interval),
        enabled: true,
    };
    let mut handle = RefreshHandle::spawn(config, news, markets);

    println!("Watching for updates; press Ctrl-C to stop.");
    loop {
        tokio::select! {
            message = handle.receiver.recv() => match message {
                Some(RefreshMessage::NewsUpdated(items)) => print_news(&items),
                Some(RefreshMessage::MarketsUpdated(coins)) => print_markets(&coins),
                Some(RefreshMessage::RefreshError(err)) => eprintln!("Refresh failed: {}", err),
                Some(RefreshMessage::RefreshStarted) | Some(RefreshMessage::RefreshCompleted) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.shutdown().await;
}

fn print_news(items: &[NewsItem]) {
    println!();
    println!("Headlines");
    println!("---------");
    if items.is_empty() {
        println!("No headlines available right now. Try `coinpulse news --refresh` later.");
        return;
    }
    for item in items {
        println!("[{}] {} ({})", item.source, item.title, item.time);
        println!("    {}", item.url);
    }
}

fn print_markets(coins: &[CoinMarket]) {
    println!();
    println!(
        "{:<6} {:<14} {:>14} {:>9} {:>16}",
        "Symbol", "Name", "Price (USD)", "24h %", "Volume (USD)"
    );
    println!("{}", "-".repeat(63));
    for coin in coins {
        println!(
            "{:<6} {:<14} {:>14.2} {:>8.2}% {:>16.0}",
            coin.symbol, coin.name, coin.price, coin.change_24h, coin.volume_24h
        );
    }
}
