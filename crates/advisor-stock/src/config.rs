//! Configuration for stock analysis operations

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by every component
///
/// Components receive it as `Arc<StockConfig>` at construction; nothing reads
/// the environment after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Chat-completion model identifier
    pub model: String,

    /// Sampling temperature for recommendations
    pub temperature: f32,

    /// Maximum tokens generated per recommendation
    pub max_tokens: usize,

    /// Cache TTL for quotes and price history
    pub cache_ttl_realtime: Duration,

    /// Maximum number of attempts for upstream calls
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Per-attempt timeout for upstream calls
    pub request_timeout: Duration,

    /// Per-attempt timeout for chat completions, which run much longer
    pub llm_timeout: Duration,

    /// Delay between live price checks of an alert
    pub alert_poll_interval: Duration,

    /// Give up on an alert after this long (None waits until cancelled)
    pub alert_timeout: Option<Duration>,

    /// Rows of the ASCII price chart
    pub chart_height: usize,

    /// Keep every n-th close when charting
    pub chart_stride: usize,

    /// Alpha Vantage API key (enables news sentiment)
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub alpha_vantage_rate_limit: u32,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            cache_ttl_realtime: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            alert_poll_interval: Duration::from_secs(60),
            alert_timeout: None,
            chart_height: 8,
            chart_stride: 5,
            alpha_vantage_api_key: None,
            alpha_vantage_rate_limit: 5,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Build a validated configuration from environment variables
    ///
    /// Reads `OPENAI_MODEL`, `ALPHA_VANTAGE_API_KEY`, `STOCK_ALERT_POLL_SECS`,
    /// `STOCK_ALERT_TIMEOUT_SECS`, `STOCK_REQUEST_TIMEOUT_SECS` and
    /// `STOCK_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder().with_env_api_key();

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(secs) = env_secs("STOCK_ALERT_POLL_SECS")? {
            builder = builder.alert_poll_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = env_secs("STOCK_ALERT_TIMEOUT_SECS")? {
            builder = builder.alert_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_secs("STOCK_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = env_secs("STOCK_LLM_TIMEOUT_SECS")? {
            builder = builder.llm_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StockError::ConfigError("model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(StockError::ConfigError(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        if self.max_retries == 0 {
            return Err(StockError::ConfigError(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero()
            || self.llm_timeout.is_zero()
            || self.alert_poll_interval.is_zero()
        {
            return Err(StockError::ConfigError(
                "request_timeout, llm_timeout and alert_poll_interval must be non-zero"
                    .to_string(),
            ));
        }

        if self.chart_height == 0 || self.chart_stride == 0 {
            return Err(StockError::ConfigError(
                "chart_height and chart_stride must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_secs(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| StockError::ConfigError(format!("{name}={raw:?} is not a number: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    cache_ttl_realtime: Option<Duration>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    request_timeout: Option<Duration>,
    llm_timeout: Option<Duration>,
    alert_poll_interval: Option<Duration>,
    alert_timeout: Option<Duration>,
    chart_height: Option<usize>,
    chart_stride: Option<usize>,
    alpha_vantage_api_key: Option<String>,
    alpha_vantage_rate_limit: Option<u32>,
}

impl StockConfigBuilder {
    /// Set the chat-completion model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token budget
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set cache TTL for quotes and history
    pub fn cache_ttl_realtime(mut self, duration: Duration) -> Self {
        self.cache_ttl_realtime = Some(duration);
        self
    }

    /// Set maximum attempts
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set chat-completion timeout
    pub fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Set alert poll interval
    pub fn alert_poll_interval(mut self, duration: Duration) -> Self {
        self.alert_poll_interval = Some(duration);
        self
    }

    /// Set alert timeout
    pub fn alert_timeout(mut self, duration: Duration) -> Self {
        self.alert_timeout = Some(duration);
        self
    }

    /// Set chart height in rows
    pub fn chart_height(mut self, rows: usize) -> Self {
        self.chart_height = Some(rows);
        self
    }

    /// Set chart downsampling stride
    pub fn chart_stride(mut self, stride: usize) -> Self {
        self.chart_stride = Some(stride);
        self
    }

    /// Set Alpha Vantage API key
    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    /// Set Alpha Vantage requests per minute
    pub fn alpha_vantage_rate_limit(mut self, per_minute: u32) -> Self {
        self.alpha_vantage_rate_limit = Some(per_minute);
        self
    }

    /// Load Alpha Vantage API key from environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Ok(key) = std::env::var("ALPHA_VANTAGE_API_KEY") {
            if !key.trim().is_empty() {
                self.alpha_vantage_api_key = Some(key);
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            model: self.model.unwrap_or(defaults.model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            cache_ttl_realtime: self.cache_ttl_realtime.unwrap_or(defaults.cache_ttl_realtime),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self.retry_backoff_base.unwrap_or(defaults.retry_backoff_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            llm_timeout: self.llm_timeout.unwrap_or(defaults.llm_timeout),
            alert_poll_interval: self
                .alert_poll_interval
                .unwrap_or(defaults.alert_poll_interval),
            alert_timeout: self.alert_timeout.or(defaults.alert_timeout),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
            chart_stride: self.chart_stride.unwrap_or(defaults.chart_stride),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            alpha_vantage_rate_limit: self
                .alpha_vantage_rate_limit
                .unwrap_or(defaults.alpha_vantage_rate_limit),
        };

        config.validate()?;
        Ok(config)
    }
}
