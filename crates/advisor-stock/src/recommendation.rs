//! LLM-backed investment recommendations

use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::market::MarketDataFetcher;
use crate::model::QuoteSnapshot;
use crate::prompts::{AnalysisContext, analysis_prompt, analyst_persona};
use crate::retry::RetryPolicy;
use crate::sentiment::{SentimentResult, SentimentScorer};
use advisor_llm::{CompletionRequest, LLMProvider, Message, TokenUsage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Narrative analysis returned by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub analysis: String,
    pub model: String,
    pub usage: TokenUsage,
    pub snapshot: QuoteSnapshot,
    /// Present only when requested and the provider answered
    pub sentiment: Option<SentimentResult>,
}

/// Builds the analysis prompt and asks the model for a recommendation
pub struct RecommendationEngine {
    fetcher: MarketDataFetcher,
    sentiment: Option<SentimentScorer>,
    llm: Arc<dyn LLMProvider>,
    config: Arc<StockConfig>,
    retry: RetryPolicy,
}

impl RecommendationEngine {
    pub fn new(
        fetcher: MarketDataFetcher,
        sentiment: Option<SentimentScorer>,
        llm: Arc<dyn LLMProvider>,
        config: Arc<StockConfig>,
    ) -> Self {
        let retry = RetryPolicy {
            attempt_timeout: config.llm_timeout,
            ..RetryPolicy::from_config(&config)
        };
        Self {
            fetcher,
            sentiment,
            llm,
            config,
            retry,
        }
    }

    /// Whether a sentiment provider is configured
    pub fn has_sentiment(&self) -> bool {
        self.sentiment.is_some()
    }

    /// Analyze `ticker`; the snapshot must succeed before the model is called
    #[instrument(skip(self))]
    pub async fn analyze(
        &self,
        ticker: &str,
        holding: bool,
        include_sentiment: bool,
    ) -> Result<Recommendation> {
        let snapshot = self.fetcher.snapshot(ticker).await?;

        let sentiment = if include_sentiment {
            self.sentiment_for(ticker).await
        } else {
            None
        };

        let prompt = analysis_prompt(&AnalysisContext {
            ticker: ticker.to_string(),
            financial_data: snapshot.to_string().trim_end().to_string(),
            holding,
            sentiment: sentiment.map(|s| s.to_string()),
        })?;

        let request = CompletionRequest::new(&self.config.model)
            .with_system(analyst_persona())
            .with_message(Message::user(prompt))
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = self
            .retry
            .execute("completion", || {
                let request = request.clone();
                async move { self.llm.complete(request).await.map_err(StockError::from) }
            })
            .await?;

        info!(
            "Recommendation for {} from {} used {} tokens",
            ticker,
            self.llm.name(),
            response.usage.total()
        );
        if response.is_truncated() {
            warn!("Analysis for {} hit the {} token limit", ticker, self.config.max_tokens);
        }

        Ok(Recommendation {
            ticker: ticker.to_string(),
            analysis: response.text().to_string(),
            model: self.config.model.clone(),
            usage: response.usage,
            snapshot,
            sentiment,
        })
    }

    /// Sentiment is best effort: failures are logged and dropped
    async fn sentiment_for(&self, ticker: &str) -> Option<SentimentResult> {
        let Some(scorer) = &self.sentiment else {
            warn!("Sentiment requested for {} but no provider is configured", ticker);
            return None;
        };

        match scorer.score(ticker).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Sentiment unavailable for {}: {}", ticker, e);
                None
            }
        }
    }
}
