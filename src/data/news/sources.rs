//! News source descriptors, relay routes, and response parsers
//!
//! Each source is described by a target URL, an ordered list of access
//! routes, and a parser for its response shape. The waterfall driver in the
//! parent module consumes these descriptors in order; adding a source means
//! adding a list entry here.

use std::env;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use url::form_urlencoded;

use super::normalize::{decode_html_entities, format_time_ago, strip_cdata};
use crate::data::NewsItem;

/// Public relay endpoints, in waterfall order.
///
/// All but the last return the target body verbatim; the allorigins `get`
/// endpoint wraps it in a JSON envelope.
const RELAY_ALLORIGINS_RAW: &str = "https://api.allorigins.win/raw?url=";
const RELAY_CORSPROXY: &str = "https://corsproxy.io/?";
const RELAY_CODETABS: &str = "https://api.codetabs.com/v1/proxy?quest=";
const RELAY_THINGPROXY: &str = "https://thingproxy.freeboard.io/fetch/";
const RELAY_ALLORIGINS_ENVELOPE: &str = "https://api.allorigins.win/get?url=";

/// Errors a parser can report for a single response body
#[derive(Debug, Error)]
pub enum ParseError {
    /// Response was not the expected JSON shape
    #[error("failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Response was not a well-formed feed
    #[error("failed to parse feed: {0}")]
    Feed(#[from] rss::Error),
}

/// Parser turning a raw response body into normalized items.
///
/// `now` is the instant relative ages are computed against. Items that
/// cannot be fully normalized are dropped, not padded.
pub type Parser = fn(&str, DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError>;

/// How a request reaches a source endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Hit the source URL as-is.
    Direct,
    /// Relay that returns the target body verbatim.
    Raw(&'static str),
    /// Relay that wraps the target body in a JSON `contents` envelope.
    Envelope(&'static str),
}

/// Envelope shape used by relays that wrap the target response
#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    contents: String,
}

impl Route {
    /// Builds the URL actually requested for `target` over this route.
    pub fn request_url(&self, target: &str) -> String {
        match self {
            Route::Direct => target.to_string(),
            Route::Raw(prefix) | Route::Envelope(prefix) => {
                format!("{}{}", prefix, encode_target(target))
            }
        }
    }

    /// Recovers the target's body from the relay response.
    pub fn unwrap_body(&self, body: String) -> Result<String, ParseError> {
        match self {
            Route::Envelope(_) => {
                let envelope: RelayEnvelope = serde_json::from_str(&body)?;
                Ok(envelope.contents)
            }
            _ => Ok(body),
        }
    }

    /// Short form for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Direct => "direct",
            Route::Raw(prefix) | Route::Envelope(prefix) => prefix,
        }
    }
}

fn encode_target(target: &str) -> String {
    form_urlencoded::byte_serialize(target.as_bytes()).collect()
}

/// One entry in the ordered waterfall: where to fetch, how to reach it, and
/// how to parse what comes back.
#[derive(Clone)]
pub struct NewsSource {
    /// Label recorded in the cache and logs
    pub label: &'static str,
    /// Target endpoint the routes point at
    pub url: String,
    /// Access routes, tried in order
    pub routes: Vec<Route>,
    /// Parser for this source's response shape
    pub parser: Parser,
}

impl std::fmt::Debug for NewsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsSource")
            .field("label", &self.label)
            .field("url", &self.url)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

/// API keys for the keyed sources, read from the environment.
///
/// Each falls back to the literal `"demo"` when unset, which the free tiers
/// of these services accept with tight rate limits.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    pub cryptopanic: String,
    pub newsapi: String,
    pub alphavantage: String,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            cryptopanic: "demo".to_string(),
            newsapi: "demo".to_string(),
            alphavantage: "demo".to_string(),
        }
    }
}

impl ApiKeys {
    /// Reads keys from `CRYPTOPANIC_API_KEY`, `NEWS_API_KEY`, and
    /// `ALPHA_VANTAGE_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            cryptopanic: env::var("CRYPTOPANIC_API_KEY").unwrap_or_else(|_| "demo".to_string()),
            newsapi: env::var("NEWS_API_KEY").unwrap_or_else(|_| "demo".to_string()),
            alphavantage: env::var("ALPHA_VANTAGE_API_KEY").unwrap_or_else(|_| "demo".to_string()),
        }
    }
}

/// Builds the canonical ordered source list.
///
/// Priority order: CryptoPanic, CoinTelegraph RSS, NewsAPI, Alpha Vantage,
/// and CoinDesk RSS as the last resort. The first source to yield at least
/// one item wins outright.
pub fn default_sources(keys: &ApiKeys) -> Vec<NewsSource> {
    let all_relays = vec![
        Route::Raw(RELAY_ALLORIGINS_RAW),
        Route::Raw(RELAY_CORSPROXY),
        Route::Raw(RELAY_CODETABS),
        Route::Raw(RELAY_THINGPROXY),
        Route::Envelope(RELAY_ALLORIGINS_ENVELOPE),
    ];
    let primary_relays = vec![
        Route::Raw(RELAY_ALLORIGINS_RAW),
        Route::Raw(RELAY_CORSPROXY),
    ];

    vec![
        NewsSource {
            label: "CryptoPanic",
            url: format!(
                "https://cryptopanic.com/api/free/v1/posts/?auth_token={}&public=true&kind=news&currencies=BTC,ETH&regions=en",
                keys.cryptopanic
            ),
            routes: all_relays.clone(),
            parser: parse_cryptopanic,
        },
        NewsSource {
            label: "CoinTelegraph",
            url: "https://cointelegraph.com/rss".to_string(),
            routes: all_relays,
            parser: parse_cointelegraph,
        },
        NewsSource {
            label: "NewsAPI",
            url: format!(
                "https://newsapi.org/v2/everything?q=bitcoin OR ethereum OR crypto&sortBy=publishedAt&pageSize=6&apiKey={}",
                keys.newsapi
            ),
            routes: primary_relays.clone(),
            parser: parse_newsapi,
        },
        NewsSource {
            label: "Alpha Vantage",
            url: format!(
                "https://www.alphavantage.co/query?function=NEWS_SENTIMENT&tickers=CRYPTO:BTC,CRYPTO:ETH&sort=LATEST&limit=6&apikey={}",
                keys.alphavantage
            ),
            routes: primary_relays,
            parser: parse_alphavantage,
        },
        NewsSource {
            label: "CoinDesk",
            url: "https://www.coindesk.com/arc/outboundfeeds/rss/".to_string(),
            routes: vec![Route::Raw(RELAY_ALLORIGINS_RAW)],
            parser: parse_coindesk,
        },
    ]
}

/// CryptoPanic posts API response
#[derive(Debug, Deserialize)]
struct CryptoPanicResponse {
    #[serde(default)]
    results: Vec<CryptoPanicPost>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicPost {
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<CryptoPanicSource>,
}

#[derive(Debug, Deserialize)]
struct CryptoPanicSource {
    title: Option<String>,
}

pub fn parse_cryptopanic(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError> {
    let response: CryptoPanicResponse = serde_json::from_str(body)?;
    let items = response
        .results
        .into_iter()
        .filter_map(|post| {
            let title = post.title.filter(|t| !t.is_empty())?;
            let url = post.url.filter(|u| !u.is_empty())?;
            let published = parse_rfc3339(&post.published_at?)?;
            let source = post
                .source
                .and_then(|s| s.title)
                .unwrap_or_else(|| "CryptoPanic".to_string());
            Some(NewsItem {
                title: decode_html_entities(&title),
                source,
                time: format_time_ago(published, now),
                url,
            })
        })
        .collect();
    Ok(items)
}

/// NewsAPI everything-search response
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

pub fn parse_newsapi(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError> {
    let response: NewsApiResponse = serde_json::from_str(body)?;
    let items = response
        .articles
        .into_iter()
        .filter_map(|article| {
            let title = article.title.filter(|t| !t.is_empty())?;
            let url = article.url.filter(|u| !u.is_empty())?;
            let published = parse_rfc3339(&article.published_at?)?;
            let source = article
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "NewsAPI".to_string());
            Some(NewsItem {
                title: decode_html_entities(&title),
                source,
                time: format_time_ago(published, now),
                url,
            })
        })
        .collect();
    Ok(items)
}

/// Alpha Vantage news-sentiment response
#[derive(Debug, Deserialize)]
struct AlphaVantageResponse {
    #[serde(default)]
    feed: Vec<AlphaVantageArticle>,
}

#[derive(Debug, Deserialize)]
struct AlphaVantageArticle {
    title: Option<String>,
    url: Option<String>,
    time_published: Option<String>,
    source: Option<String>,
}

pub fn parse_alphavantage(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError> {
    let response: AlphaVantageResponse = serde_json::from_str(body)?;
    let items = response
        .feed
        .into_iter()
        .filter_map(|article| {
            let title = article.title.filter(|t| !t.is_empty())?;
            let url = article.url.filter(|u| !u.is_empty())?;
            let published = parse_compact_timestamp(&article.time_published?)?;
            let source = article
                .source
                .unwrap_or_else(|| "Alpha Vantage".to_string());
            Some(NewsItem {
                title: decode_html_entities(&title),
                source,
                time: format_time_ago(published, now),
                url,
            })
        })
        .collect();
    Ok(items)
}

pub fn parse_cointelegraph(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError> {
    parse_rss_feed(body, now, "CoinTelegraph")
}

pub fn parse_coindesk(body: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, ParseError> {
    parse_rss_feed(body, now, "CoinDesk")
}

fn parse_rss_feed(
    body: &str,
    now: DateTime<Utc>,
    source_name: &str,
) -> Result<Vec<NewsItem>, ParseError> {
    let channel = rss::Channel::read_from(body.as_bytes())?;
    let items = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?;
            let url = item.link()?;
            let published = parse_rfc2822(item.pub_date()?)?;
            Some(NewsItem {
                title: decode_html_entities(&strip_cdata(title)),
                source: source_name.to_string(),
                time: format_time_ago(published, now),
                url: url.to_string(),
            })
        })
        .collect();
    Ok(items)
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rfc2822(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses Alpha Vantage's compact `YYYYMMDDTHHMMSS` timestamps as UTC.
fn parse_compact_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-07-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_route_request_url_direct() {
        let route = Route::Direct;
        assert_eq!(
            route.request_url("https://example.com/feed"),
            "https://example.com/feed"
        );
    }

    #[test]
    fn test_route_request_url_relay_encodes_target() {
        let route = Route::Raw(RELAY_ALLORIGINS_RAW);
        let url = route.request_url("https://example.com/feed?a=1&b=2");

        assert!(url.starts_with(RELAY_ALLORIGINS_RAW));
        // The target must be a single opaque query value.
        assert!(!url[RELAY_ALLORIGINS_RAW.len()..].contains("://"));
        assert!(!url[RELAY_ALLORIGINS_RAW.len()..].contains('&'));
    }

    #[test]
    fn test_route_unwrap_body_raw_is_identity() {
        let route = Route::Raw(RELAY_CORSPROXY);
        let body = route.unwrap_body("payload".to_string()).unwrap();
        assert_eq!(body, "payload");
    }

    #[test]
    fn test_route_unwrap_body_envelope() {
        let route = Route::Envelope(RELAY_ALLORIGINS_ENVELOPE);
        let wrapped = r#"{"contents": "inner body", "status": {"http_code": 200}}"#;
        let body = route.unwrap_body(wrapped.to_string()).unwrap();
        assert_eq!(body, "inner body");
    }

    #[test]
    fn test_route_unwrap_body_envelope_missing_field_errors() {
        let route = Route::Envelope(RELAY_ALLORIGINS_ENVELOPE);
        let result = route.unwrap_body(r#"{"status": 200}"#.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_default_sources_order_and_routes() {
        let sources = default_sources(&ApiKeys::default());

        let labels: Vec<&str> = sources.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec![
                "CryptoPanic",
                "CoinTelegraph",
                "NewsAPI",
                "Alpha Vantage",
                "CoinDesk"
            ]
        );

        assert_eq!(sources[0].routes.len(), 5);
        assert_eq!(sources[1].routes.len(), 5);
        assert_eq!(sources[2].routes.len(), 2);
        assert_eq!(sources[3].routes.len(), 2);
        assert_eq!(sources[4].routes.len(), 1);
    }

    #[test]
    fn test_default_sources_embed_api_keys() {
        let keys = ApiKeys {
            cryptopanic: "cp-key".to_string(),
            newsapi: "na-key".to_string(),
            alphavantage: "av-key".to_string(),
        };
        let sources = default_sources(&keys);

        assert!(sources[0].url.contains("auth_token=cp-key"));
        assert!(sources[2].url.contains("apiKey=na-key"));
        assert!(sources[3].url.contains("apikey=av-key"));
    }

    const CRYPTOPANIC_RESPONSE: &str = r#"{
        "count": 3,
        "results": [
            {
                "kind": "news",
                "title": "Bitcoin &amp; Ethereum Rally",
                "published_at": "2024-07-15T11:55:00Z",
                "url": "https://cryptopanic.com/news/1",
                "source": {"title": "CoinJournal", "domain": "coinjournal.net"}
            },
            {
                "kind": "news",
                "title": "ETH staking yields climb",
                "published_at": "2024-07-15T09:00:00Z",
                "url": "https://cryptopanic.com/news/2",
                "source": {"domain": "example.com"}
            },
            {
                "kind": "news",
                "title": "Missing link",
                "published_at": "2024-07-15T08:00:00Z",
                "source": {"title": "Nowhere"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_cryptopanic() {
        let items = parse_cryptopanic(CRYPTOPANIC_RESPONSE, now()).unwrap();

        // The third post has no URL and is dropped.
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Bitcoin & Ethereum Rally");
        assert_eq!(items[0].source, "CoinJournal");
        assert_eq!(items[0].time, "5m ago");
        assert_eq!(items[0].url, "https://cryptopanic.com/news/1");

        // Missing source title falls back to the aggregator name.
        assert_eq!(items[1].source, "CryptoPanic");
        assert_eq!(items[1].time, "3h ago");
    }

    #[test]
    fn test_parse_cryptopanic_missing_results_yields_empty() {
        let items = parse_cryptopanic(r#"{"info": "rate limited"}"#, now()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_parse_cryptopanic_malformed_json_errors() {
        assert!(parse_cryptopanic("{ not json", now()).is_err());
        assert!(parse_cryptopanic("<html>busy</html>", now()).is_err());
    }

    const NEWSAPI_RESPONSE: &str = r#"{
        "status": "ok",
        "totalResults": 2,
        "articles": [
            {
                "source": {"id": null, "name": "TechDaily"},
                "title": "Crypto markets steady ahead of halving",
                "url": "https://technews.example.com/halving",
                "publishedAt": "2024-07-15T10:00:00Z"
            },
            {
                "source": {"id": null, "name": null},
                "title": "Stablecoin volumes surge",
                "url": "https://technews.example.com/stablecoins",
                "publishedAt": "2024-07-13T12:00:00Z"
            }
        ]
    }"#;

    #[test]
    fn test_parse_newsapi() {
        let items = parse_newsapi(NEWSAPI_RESPONSE, now()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "TechDaily");
        assert_eq!(items[0].time, "2h ago");
        assert_eq!(items[1].source, "NewsAPI");
        assert_eq!(items[1].time, "2d ago");
    }

    const ALPHAVANTAGE_RESPONSE: &str = r#"{
        "items": "1",
        "feed": [
            {
                "title": "BTC sentiment turns bullish",
                "url": "https://finance.example.com/btc",
                "time_published": "20240715T114000",
                "source": "Finance Wire",
                "overall_sentiment_label": "Bullish"
            }
        ]
    }"#;

    #[test]
    fn test_parse_alphavantage() {
        let items = parse_alphavantage(ALPHAVANTAGE_RESPONSE, now()).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "BTC sentiment turns bullish");
        assert_eq!(items[0].source, "Finance Wire");
        assert_eq!(items[0].time, "20m ago");
    }

    #[test]
    fn test_parse_alphavantage_information_only_yields_empty() {
        // The demo key returns an informational message with no feed.
        let body = r#"{"Information": "Please consider upgrading to premium"}"#;
        let items = parse_alphavantage(body, now()).unwrap();
        assert!(items.is_empty());
    }

    const RSS_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Crypto Feed</title>
    <link>https://feed.example.com</link>
    <description>Latest crypto headlines</description>
    <item>
      <title><![CDATA[Bitcoin miners &amp; the halving]]></title>
      <link>https://feed.example.com/miners</link>
      <pubDate>Mon, 15 Jul 2024 11:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Layer 2 fees drop again</title>
      <link>https://feed.example.com/l2-fees</link>
      <pubDate>Sun, 14 Jul 2024 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No date on this one</title>
      <link>https://feed.example.com/undated</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_feed() {
        let items = parse_cointelegraph(RSS_RESPONSE, now()).unwrap();

        // The undated item is dropped.
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Bitcoin miners & the halving");
        assert_eq!(items[0].source, "CoinTelegraph");
        assert_eq!(items[0].time, "30m ago");
        assert_eq!(items[0].url, "https://feed.example.com/miners");

        assert_eq!(items[1].time, "1d ago");
    }

    #[test]
    fn test_parse_rss_sets_source_name_per_feed() {
        let items = parse_coindesk(RSS_RESPONSE, now()).unwrap();
        assert!(items.iter().all(|item| item.source == "CoinDesk"));
    }

    #[test]
    fn test_parse_rss_malformed_errors() {
        assert!(parse_cointelegraph("this is not xml at all", now()).is_err());
    }

    #[test]
    fn test_parse_compact_timestamp() {
        let parsed = parse_compact_timestamp("20240715T114000").unwrap();
        assert_eq!(parsed, now() - Duration::minutes(20));

        assert!(parse_compact_timestamp("2024-07-15").is_none());
        assert!(parse_compact_timestamp("garbage").is_none());
    }

    #[test]
    fn test_api_keys_default_to_demo() {
        let keys = ApiKeys::default();
        assert_eq!(keys.cryptopanic, "demo");
        assert_eq!(keys.newsapi, "demo");
        assert_eq!(keys.alphavantage, "demo");
    }
}
