//! Market data types shared by the fetcher, chart, risk and recommendation components

use crate::error::StockError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown for any field the provider did not return
pub const NOT_AVAILABLE: &str = "N/A";

/// Lookback window for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    /// Every accepted period, shortest first
    pub const ALL: [Period; 8] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
    ];

    /// Provider range string
    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
        }
    }

    /// Calendar days covered by the period
    pub fn days(self) -> i64 {
        match self {
            Period::OneDay => 1,
            Period::FiveDays => 5,
            Period::OneMonth => 30,
            Period::ThreeMonths => 90,
            Period::SixMonths => 180,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1825,
        }
    }

    /// `1d/5d/1mo/...` for prompts and error messages
    pub fn choices() -> String {
        Self::ALL.map(Period::as_str).join("/")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| {
                StockError::InvalidInput(format!(
                    "unknown period '{s}', choose from: {}",
                    Self::ALL.map(Period::as_str).join(", ")
                ))
            })
    }
}

/// One closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Ordered closing prices for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_close(&self) -> Option<f64> {
        self.points.first().map(|p| p.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}

/// Raw quote fields as returned by the provider
///
/// `dividend_yield` is the provider's fraction (0.005 = 0.5 %).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteFields {
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<u64>,
    pub average_volume: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// Point-in-time price and fundamentals for one security
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<u64>,
    pub average_volume: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Percent, already scaled from the provider fraction
    pub dividend_yield_pct: Option<f64>,
    /// Percent change from first to last close over one month
    pub one_month_return_pct: f64,
}

impl QuoteSnapshot {
    /// Combine provider fields with the computed 1-month return
    pub fn from_fields(symbol: impl Into<String>, fields: QuoteFields, one_month_return_pct: f64) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: fields.company_name,
            current_price: fields.current_price,
            fifty_two_week_high: fields.fifty_two_week_high,
            fifty_two_week_low: fields.fifty_two_week_low,
            market_cap: fields.market_cap,
            volume: fields.volume,
            average_volume: fields.average_volume,
            pe_ratio: fields.pe_ratio,
            eps: fields.eps,
            dividend_yield_pct: fields.dividend_yield.map(|y| y * 100.0),
            one_month_return_pct,
        }
    }

    /// Labelled, display-ready values in a fixed order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Symbol", self.symbol.clone()),
            (
                "Company Name",
                self.company_name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
            ("Current Price", fmt_decimal(self.current_price)),
            ("52 Week High", fmt_decimal(self.fifty_two_week_high)),
            ("52 Week Low", fmt_decimal(self.fifty_two_week_low)),
            ("Market Cap", fmt_whole(self.market_cap)),
            ("Volume", fmt_count(self.volume)),
            ("Average Volume", fmt_count(self.average_volume)),
            ("PE Ratio", fmt_decimal(self.pe_ratio)),
            ("EPS", fmt_decimal(self.eps)),
            ("Dividend Yield", fmt_percent(self.dividend_yield_pct)),
            ("1 Month Return", fmt_percent(Some(self.one_month_return_pct))),
        ]
    }
}

impl fmt::Display for QuoteSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.rows() {
            writeln!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

fn fmt_decimal(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}

fn fmt_whole(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.0}"))
}

fn fmt_count(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("1mo".parse::<Period>().unwrap(), Period::OneMonth);
        assert_eq!(" 5Y ".parse::<Period>().unwrap(), Period::FiveYears);
        assert!("10y".parse::<Period>().is_err());
        assert!("".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_display_round_trips_all() {
        for period in Period::ALL {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
        assert_eq!(Period::choices(), "1d/5d/1mo/3mo/6mo/1y/2y/5y");
    }

    #[test]
    fn test_snapshot_scales_dividend_yield() {
        let fields = QuoteFields {
            dividend_yield: Some(0.0052),
            ..Default::default()
        };
        let snapshot = QuoteSnapshot::from_fields("AAPL", fields, 1.5);
        let pct = snapshot.dividend_yield_pct.unwrap();
        assert!((pct - 0.52).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fields_render_as_not_available() {
        let snapshot = QuoteSnapshot::from_fields("XYZ", QuoteFields::default(), -3.25);
        let text = snapshot.to_string();
        assert!(text.contains("Company Name: N/A"));
        assert!(text.contains("PE Ratio: N/A"));
        assert!(text.contains("Dividend Yield: N/A"));
        assert!(text.contains("1 Month Return: -3.25%"));
    }
}
