//! Volatility-based position sizing

use crate::error::{Result, StockError};
use crate::market::MarketDataFetcher;
use crate::model::Period;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Suggested position for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Sample standard deviation of daily fractional changes
    pub daily_volatility: f64,
    /// Dollar amount, rounded to cents
    pub suggested_position: f64,
    pub max_shares: u64,
    pub current_price: f64,
}

/// Sample standard deviation (n - 1) of day-over-day fractional changes
pub fn daily_volatility(closes: &[f64]) -> Result<f64> {
    let changes: Vec<f64> = closes
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();

    if changes.len() < 2 {
        return Err(StockError::InsufficientData(format!(
            "need at least 3 closes for volatility, got {}",
            closes.len()
        )));
    }

    let n = changes.len() as f64;
    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let vol = variance.sqrt();

    if !vol.is_finite() {
        return Err(StockError::InsufficientData(
            "volatility is not finite".to_string(),
        ));
    }
    Ok(vol)
}

/// Dollar amount and share count for the given account and risk budget
///
/// `account * risk_pct / 100 * (1 - volatility)`, rounded to 2 dp.
pub fn position_size(
    account_size: f64,
    risk_pct: f64,
    volatility: f64,
    current_price: f64,
) -> Result<PositionSize> {
    if !account_size.is_finite() || account_size <= 0.0 {
        return Err(StockError::InvalidInput(format!(
            "account size must be positive, got {account_size}"
        )));
    }
    if !risk_pct.is_finite() || risk_pct <= 0.0 || risk_pct > 100.0 {
        return Err(StockError::InvalidInput(format!(
            "risk percentage must be in (0, 100], got {risk_pct}"
        )));
    }
    if !current_price.is_finite() || current_price <= 0.0 {
        return Err(StockError::InsufficientData(format!(
            "unusable current price {current_price}"
        )));
    }

    let raw = account_size * (risk_pct / 100.0) * (1.0 - volatility);
    let suggested_position = (raw * 100.0).round() / 100.0;
    let max_shares = (suggested_position / current_price).round().max(0.0) as u64;

    Ok(PositionSize {
        daily_volatility: volatility,
        suggested_position,
        max_shares,
        current_price,
    })
}

/// Sizes positions from a month of price history
pub struct RiskSizer {
    fetcher: MarketDataFetcher,
}

impl RiskSizer {
    pub fn new(fetcher: MarketDataFetcher) -> Self {
        Self { fetcher }
    }

    #[instrument(skip(self))]
    pub async fn size(&self, symbol: &str, account_size: f64, risk_pct: f64) -> Result<PositionSize> {
        let history = self.fetcher.history(symbol, Period::OneMonth).await?;
        if history.is_empty() {
            return Err(StockError::InsufficientData(format!(
                "no price history for {symbol}"
            )));
        }

        let volatility = daily_volatility(&history.closes())?;
        let price = self.fetcher.current_price(symbol, &history).await?;
        position_size(account_size, risk_pct, volatility, price)
    }
}
