//! Yahoo Finance API client

use super::MarketDataProvider;
use crate::error::{Result, StockError};
use crate::model::{Period, PriceHistory, PricePoint, QuoteFields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stock-advisor";

/// Live prices read the latest 1-minute bar of today's session; Yahoo serves
/// 1-minute bars only for about a week
const LIVE_INTERVAL: &str = "1m";
const LIVE_RANGE: &str = "1d";

/// Yahoo Finance API client
///
/// Price bars and live prices come from `yahoo_finance_api`; the fundamental
/// fields come from the JSON quote endpoint.
pub struct YahooFinanceClient {
    connector: yahoo::YahooConnector,
    http: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { connector, http })
    }

    async fn fetch_quote_fields(&self, symbol: &str) -> Result<QuoteFields> {
        let response = self
            .http
            .get(QUOTE_URL)
            .query(&[("symbols", symbol)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(StockError::YahooFinanceError(format!(
                "quote request for {symbol} failed with HTTP {status}"
            )));
        }

        let envelope: QuoteEnvelope = response.json().await?;
        quote_fields_from_envelope(symbol, envelope)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    #[instrument(skip(self))]
    async fn quote_fields(&self, symbol: &str) -> Result<QuoteFields> {
        self.fetch_quote_fields(symbol).await
    }

    #[instrument(skip(self))]
    async fn history(&self, symbol: &str, period: Period) -> Result<PriceHistory> {
        let response = self
            .connector
            .get_quote_range(symbol, "1d", period.as_str())
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter(|q| q.close.is_finite())
            .map(|q| PricePoint {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                close: q.close,
            })
            .collect();

        debug!("Fetched {} closes for {}", points.len(), symbol);
        Ok(PriceHistory::new(symbol, points))
    }

    #[instrument(skip(self))]
    async fn live_price(&self, symbol: &str) -> Result<f64> {
        let response = self
            .connector
            .get_quote_range(symbol, LIVE_INTERVAL, LIVE_RANGE)
            .await
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quote = response
            .last_quote()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(quote.close)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuote {
    long_name: Option<String>,
    short_name: Option<String>,
    current_price: Option<f64>,
    regular_market_price: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    market_cap: Option<f64>,
    regular_market_volume: Option<u64>,
    average_daily_volume3_month: Option<u64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    eps_trailing_twelve_months: Option<f64>,
    trailing_annual_dividend_yield: Option<f64>,
}

fn quote_fields_from_envelope(symbol: &str, envelope: QuoteEnvelope) -> Result<QuoteFields> {
    let raw = envelope
        .quote_response
        .result
        .into_iter()
        .next()
        .ok_or_else(|| StockError::InvalidSymbol(symbol.to_string()))?;

    Ok(QuoteFields {
        company_name: raw.long_name.or(raw.short_name),
        current_price: raw.current_price.or(raw.regular_market_price),
        fifty_two_week_high: raw.fifty_two_week_high,
        fifty_two_week_low: raw.fifty_two_week_low,
        market_cap: raw.market_cap,
        volume: raw.regular_market_volume,
        average_volume: raw.average_daily_volume3_month,
        pe_ratio: raw.trailing_pe,
        eps: raw.eps_trailing_twelve_months,
        // A zero yield means "no dividend", which reads better as N/A
        dividend_yield: raw.trailing_annual_dividend_yield.filter(|y| *y > 0.0),
    })
}
