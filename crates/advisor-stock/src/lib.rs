//! Interactive stock analysis assistant
//!
//! This crate pulls quotes and price history from Yahoo Finance, optionally
//! scores news sentiment through Alpha Vantage, and asks a chat-completion
//! model for a narrative recommendation. Around that it offers:
//!
//! - ASCII price charts for a chosen lookback period
//! - An in-memory portfolio ledger with ROI, profit/loss and sector weights
//! - Volatility-based position sizing
//! - Background price alerts that can be cancelled or time out
//!
//! # Architecture
//!
//! Upstream services sit behind the [`api::MarketDataProvider`],
//! [`api::SentimentProvider`] and [`advisor_llm::LLMProvider`] traits. The
//! components take those as `Arc<dyn _>` at construction, and the
//! [`shell::Shell`] ties them together over any `BufRead`/`Write` pair.
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_stock::api::YahooFinanceClient;
//! use advisor_stock::{MarketDataFetcher, StockConfig};
//! use std::sync::Arc;
//!
//! let config = StockConfig::default();
//! let yahoo = Arc::new(YahooFinanceClient::new(config.request_timeout)?);
//! let fetcher = MarketDataFetcher::new(yahoo, &config);
//! println!("{}", fetcher.snapshot("AAPL").await?);
//! ```

pub mod alert;
pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod market;
pub mod model;
pub mod portfolio;
pub mod prompts;
pub mod recommendation;
pub mod retry;
pub mod risk;
pub mod sentiment;
pub mod shell;

pub use alert::{AlertDirection, AlertHandle, AlertOutcome, AlertWatcher, PriceAlert};
pub use chart::{Chart, ChartRenderer};
pub use config::StockConfig;
pub use error::{Result, StockError};
pub use market::MarketDataFetcher;
pub use model::{Period, PriceHistory, PricePoint, QuoteSnapshot};
pub use portfolio::{Ledger, Position, SharedLedger};
pub use recommendation::{Recommendation, RecommendationEngine};
pub use risk::{PositionSize, RiskSizer};
pub use sentiment::{SentimentLabel, SentimentResult, SentimentScorer};
pub use shell::{Interrupts, Services, Shell};
