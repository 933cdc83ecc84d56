//! API clients for market data and news sentiment providers
//!
//! The traits here are the seams the rest of the crate depends on; the
//! concrete clients are only constructed by the binary.

pub mod alpha_vantage;
pub mod yahoo;

pub use alpha_vantage::{AlphaVantageClient, NewsArticle, NewsSentimentResponse, TickerSentiment};
pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::model::{Period, PriceHistory, QuoteFields};
use async_trait::async_trait;

/// Source of quotes, price history and live prices
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Named fundamental fields for a symbol
    async fn quote_fields(&self, symbol: &str) -> Result<QuoteFields>;

    /// Daily closes for the given lookback period
    async fn history(&self, symbol: &str, period: Period) -> Result<PriceHistory>;

    /// Most recent traded price
    async fn live_price(&self, symbol: &str) -> Result<f64>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Source of scored news sentiment
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Articles mentioning the symbol, with per-ticker sentiment scores
    async fn news_sentiment(&self, symbol: &str) -> Result<NewsSentimentResponse>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
