//! Error types for stock analysis operations

use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// User-supplied value failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Not enough samples to compute a meaningful value
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Portfolio position does not exist
    #[error("Symbol {0} not found in portfolio")]
    NotFound(String),

    /// Portfolio already holds the symbol
    #[error("Portfolio already has a position in {0}")]
    DuplicatePosition(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Upstream call did not finish in time
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Alpha Vantage API error
    #[error("Alpha Vantage error: {0}")]
    AlphaVantageError(String),

    /// Language model call failed
    #[error("Analysis service error: {0}")]
    Llm(#[from] advisor_llm::LLMError),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

impl StockError {
    /// Whether the same call may succeed if retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError(_)
            | Self::YahooFinanceError(_)
            | Self::AlphaVantageError(_)
            | Self::RateLimitExceeded { .. }
            | Self::Timeout { .. } => true,
            Self::NetworkError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Llm(e) => e.is_transient(),
            _ => false,
        }
    }
}
