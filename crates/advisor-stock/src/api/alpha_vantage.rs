//! Alpha Vantage news sentiment client

use super::SentimentProvider;
use crate::error::{Result, StockError};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// `NEWS_SENTIMENT` response body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsSentimentResponse {
    #[serde(default)]
    pub feed: Vec<NewsArticle>,
}

/// One scored article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub time_published: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall_sentiment_score: f64,
    #[serde(default)]
    pub ticker_sentiment: Vec<TickerSentiment>,
}

/// Sentiment of one article towards one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub ticker: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub relevance_score: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub ticker_sentiment_score: f64,
    #[serde(default)]
    pub ticker_sentiment_label: String,
}

/// Alpha Vantage sends scores as strings in some fields and numbers in others
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl AlphaVantageClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `api_key` - Alpha Vantage API key
    /// * `rate_limit` - Maximum requests per minute (free tier: 5)
    /// * `request_timeout` - HTTP timeout per request
    pub fn new(
        api_key: impl Into<String>,
        rate_limit: u32,
        request_timeout: Duration,
    ) -> Result<Self> {
        let per_minute = NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            api_key: api_key.into(),
            rate_limiter,
        })
    }

    /// Create from `ALPHA_VANTAGE_API_KEY` with the free-tier rate limit
    pub fn from_env(request_timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY").map_err(|_| {
            StockError::ConfigError("ALPHA_VANTAGE_API_KEY environment variable not set".to_string())
        })?;

        Self::new(api_key, 5, request_timeout)
    }
}

#[async_trait]
impl SentimentProvider for AlphaVantageClient {
    #[instrument(skip(self))]
    async fn news_sentiment(&self, symbol: &str) -> Result<NewsSentimentResponse> {
        self.rate_limiter.until_ready().await;

        let params = [
            ("function", "NEWS_SENTIMENT"),
            ("tickers", symbol),
            ("apikey", self.api_key.as_str()),
        ];

        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(StockError::AlphaVantageError(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let data: serde_json::Value = response.json().await?;
        parse_news_sentiment(data)
    }

    fn name(&self) -> &'static str {
        "alpha_vantage"
    }
}

fn parse_news_sentiment(data: serde_json::Value) -> Result<NewsSentimentResponse> {
    if let Some(error) = data.get("Error Message") {
        return Err(StockError::AlphaVantageError(error.to_string()));
    }

    // Throttled requests come back as 200 with a "Note" or "Information" body
    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(StockError::RateLimitExceeded {
            provider: "Alpha Vantage".to_string(),
        });
    }

    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = AlphaVantageClient::new("test_key", 5, Duration::from_secs(10)).unwrap();
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.name(), "alpha_vantage");
    }

    #[test]
    fn test_parse_feed_with_string_scores() {
        let data = json!({
            "items": "1",
            "feed": [{
                "title": "Apple beats estimates",
                "source": "Reuters",
                "time_published": "20240501T210000",
                "overall_sentiment_score": 0.31,
                "ticker_sentiment": [{
                    "ticker": "AAPL",
                    "relevance_score": "0.82",
                    "ticker_sentiment_score": "0.412",
                    "ticker_sentiment_label": "Bullish"
                }]
            }]
        });

        let parsed = parse_news_sentiment(data).unwrap();
        assert_eq!(parsed.feed.len(), 1);
        let ts = &parsed.feed[0].ticker_sentiment[0];
        assert!((ts.relevance_score - 0.82).abs() < 1e-9);
        assert!((ts.ticker_sentiment_score - 0.412).abs() < 1e-9);
    }

    #[test]
    fn test_rate_limit_note() {
        let data = json!({"Information": "Thank you for using Alpha Vantage! ..."});
        assert!(matches!(
            parse_news_sentiment(data),
            Err(StockError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_error_message() {
        let data = json!({"Error Message": "Invalid API call"});
        assert!(matches!(
            parse_news_sentiment(data),
            Err(StockError::AlphaVantageError(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires API key and network access
    async fn test_news_sentiment_live() {
        let client = AlphaVantageClient::from_env(Duration::from_secs(30)).unwrap();
        let response = client.news_sentiment("AAPL").await.unwrap();
        assert!(!response.feed.is_empty());
    }
}
