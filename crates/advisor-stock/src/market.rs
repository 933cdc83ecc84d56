//! Market data fetcher: quote snapshots and cached price history

use crate::api::MarketDataProvider;
use crate::cache::{CacheKey, StockCache};
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::model::{Period, PriceHistory, QuoteFields, QuoteSnapshot};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Percent change from the first to the last close
///
/// `(last / first - 1) * 100`. Fewer than two closes or a zero first close
/// has no defined return.
pub fn one_month_return(history: &PriceHistory) -> Result<f64> {
    let (Some(first), Some(last)) = (history.first_close(), history.last_close()) else {
        return Err(StockError::InsufficientData(format!(
            "no price history for {}",
            history.symbol
        )));
    };
    if history.len() < 2 {
        return Err(StockError::InsufficientData(format!(
            "a single close for {} has no return",
            history.symbol
        )));
    }

    if first == 0.0 || !first.is_finite() || !last.is_finite() {
        return Err(StockError::InsufficientData(format!(
            "first close for {} is not usable ({first})",
            history.symbol
        )));
    }

    Ok((last / first - 1.0) * 100.0)
}

/// Fetches quotes and history through a provider, with caching and retries
#[derive(Clone)]
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: StockCache,
    retry: RetryPolicy,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &StockConfig) -> Self {
        Self {
            provider,
            cache: StockCache::new(config.cache_ttl_realtime),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Quote fields plus the 1-month return, as one snapshot
    #[instrument(skip(self))]
    pub async fn snapshot(&self, symbol: &str) -> Result<QuoteSnapshot> {
        let history = self.history(symbol, Period::OneMonth).await?;
        let one_month = one_month_return(&history)?;
        let fields = self.quote_fields_or_blank(symbol).await;

        debug!("Built snapshot for {} ({:.2}% 1mo)", symbol, one_month);
        Ok(QuoteSnapshot::from_fields(symbol, fields, one_month))
    }

    /// Daily closes for `period`, cached for the realtime TTL
    pub async fn history(&self, symbol: &str, period: Period) -> Result<PriceHistory> {
        let key = CacheKey::new(symbol, "history", period.as_str());
        self.cache
            .get_or_fetch(key, || {
                self.retry.execute("history", || self.provider.history(symbol, period))
            })
            .await
    }

    /// Named quote fields, cached for the realtime TTL
    pub async fn quote_fields(&self, symbol: &str) -> Result<QuoteFields> {
        let key = CacheKey::new(symbol, "quote", "");
        self.cache
            .get_or_fetch(key, || {
                self.retry.execute("quote", || self.provider.quote_fields(symbol))
            })
            .await
    }

    /// Quote fields, or all-`N/A` fields when the quote request fails
    async fn quote_fields_or_blank(&self, symbol: &str) -> QuoteFields {
        self.quote_fields(symbol).await.unwrap_or_else(|e| {
            warn!("Quote fields for {} unavailable: {}", symbol, e);
            QuoteFields::default()
        })
    }

    /// Current price, never cached
    pub async fn live_price(&self, symbol: &str) -> Result<f64> {
        self.retry
            .execute("live_price", || self.provider.live_price(symbol))
            .await
    }

    /// Best available current price: the quote field, else the last close
    pub async fn current_price(&self, symbol: &str, history: &PriceHistory) -> Result<f64> {
        let quoted = self.quote_fields_or_blank(symbol).await.current_price;
        quoted
            .or_else(|| history.last_close())
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| StockError::InsufficientData(format!("no current price for {symbol}")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted market data provider shared by the crate's tests

    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::model::PricePoint;

    pub fn history_of(symbol: &str, closes: &[f64]) -> PriceHistory {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: start + ChronoDuration::days(i as i64),
                close,
            })
            .collect();
        PriceHistory::new(symbol, points)
    }

    #[derive(Default)]
    pub struct StubMarket {
        pub closes: Vec<f64>,
        pub fields: QuoteFields,
        pub live_prices: Mutex<VecDeque<f64>>,
        pub fail_history: bool,
        pub fail_quote: bool,
        pub history_calls: AtomicUsize,
        pub live_calls: AtomicUsize,
    }

    impl StubMarket {
        pub fn with_closes(closes: &[f64]) -> Self {
            Self {
                closes: closes.to_vec(),
                ..Default::default()
            }
        }

        pub fn with_live_prices(prices: &[f64]) -> Self {
            Self {
                live_prices: Mutex::new(prices.iter().copied().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for StubMarket {
        async fn quote_fields(&self, symbol: &str) -> Result<QuoteFields> {
            if self.fail_quote {
                return Err(StockError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "quote endpoint down".to_string(),
                });
            }
            Ok(self.fields.clone())
        }

        async fn history(&self, symbol: &str, _period: Period) -> Result<PriceHistory> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_history {
                return Err(StockError::InvalidSymbol(symbol.to_string()));
            }
            Ok(history_of(symbol, &self.closes))
        }

        async fn live_price(&self, symbol: &str) -> Result<f64> {
            self.live_calls.fetch_add(1, Ordering::SeqCst);
            let mut prices = self
                .live_prices
                .lock()
                .map_err(|_| StockError::ApiError("poisoned".to_string()))?;
            // Repeat the last scripted price once the script runs out
            match prices.len() {
                0 => Err(StockError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "no live price scripted".to_string(),
                }),
                1 => Ok(prices[0]),
                _ => Ok(prices.pop_front().unwrap_or_default()),
            }
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }
}
