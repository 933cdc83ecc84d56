//! News sentiment scoring

use crate::api::{NewsSentimentResponse, SentimentProvider};
use crate::error::{Result, StockError};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Alpha Vantage sentiment bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bearish,
    #[serde(rename = "Somewhat-Bearish")]
    SomewhatBearish,
    Neutral,
    #[serde(rename = "Somewhat-Bullish")]
    SomewhatBullish,
    Bullish,
}

impl SentimentLabel {
    /// Band for a score in `[-1, 1]`
    pub fn from_score(score: f64) -> Self {
        if score <= -0.35 {
            Self::Bearish
        } else if score <= -0.15 {
            Self::SomewhatBearish
        } else if score < 0.15 {
            Self::Neutral
        } else if score < 0.35 {
            Self::SomewhatBullish
        } else {
            Self::Bullish
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bearish => "Bearish",
            Self::SomewhatBearish => "Somewhat-Bearish",
            Self::Neutral => "Neutral",
            Self::SomewhatBullish => "Somewhat-Bullish",
            Self::Bullish => "Bullish",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated sentiment for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
    /// Articles that mentioned the ticker
    pub articles: usize,
}

impl fmt::Display for SentimentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Market Sentiment: {} (Score: {:.2})", self.label, self.score)
    }
}

/// Relevance-weighted mean of the ticker's per-article scores
///
/// Articles tagged with other tickers only are skipped. When every matching
/// article has zero relevance the plain mean is used instead.
pub fn aggregate(symbol: &str, response: &NewsSentimentResponse) -> Result<SentimentResult> {
    let matches: Vec<(f64, f64)> = response
        .feed
        .iter()
        .filter_map(|article| {
            article
                .ticker_sentiment
                .iter()
                .find(|ts| ts.ticker.eq_ignore_ascii_case(symbol))
                .map(|ts| (ts.ticker_sentiment_score, ts.relevance_score.max(0.0)))
        })
        .filter(|(score, weight)| score.is_finite() && weight.is_finite())
        .collect();

    if matches.is_empty() {
        return Err(StockError::InsufficientData(format!(
            "no news sentiment for {symbol}"
        )));
    }

    let total_weight: f64 = matches.iter().map(|(_, w)| w).sum();
    let score = if total_weight > 0.0 {
        matches.iter().map(|(s, w)| s * w).sum::<f64>() / total_weight
    } else {
        matches.iter().map(|(s, _)| s).sum::<f64>() / matches.len() as f64
    }
    .clamp(-1.0, 1.0);

    Ok(SentimentResult {
        score,
        label: SentimentLabel::from_score(score),
        articles: matches.len(),
    })
}

/// Scores a ticker through a sentiment provider
#[derive(Clone)]
pub struct SentimentScorer {
    provider: Arc<dyn SentimentProvider>,
    retry: RetryPolicy,
}

impl SentimentScorer {
    pub fn new(provider: Arc<dyn SentimentProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    #[instrument(skip(self))]
    pub async fn score(&self, symbol: &str) -> Result<SentimentResult> {
        let response = self
            .retry
            .execute("news_sentiment", || self.provider.news_sentiment(symbol))
            .await?;

        let result = aggregate(symbol, &response)?;
        debug!(
            "Sentiment for {} from {}: {:.3} over {} articles",
            symbol,
            self.provider.name(),
            result.score,
            result.articles
        );
        Ok(result)
    }
}
