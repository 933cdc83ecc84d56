//! In-memory portfolio ledger and analytics

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One holding, keyed by its upper-cased symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub initial_investment: f64,
    pub current_value: f64,
    pub sector: String,
}

impl Position {
    pub fn profit_loss(&self) -> f64 {
        self.current_value - self.initial_investment
    }
}

/// Ledger behind a mutex for callers outside the shell task
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Positions keyed by symbol, iterated in symbol order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    positions: BTreeMap<String, Position>,
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(StockError::InvalidInput("symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

fn check_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(StockError::InvalidInput(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(&symbol.trim().to_ascii_uppercase())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// Add a new position; an existing symbol is rejected
    pub fn add(
        &mut self,
        symbol: &str,
        initial_investment: f64,
        current_value: f64,
        sector: &str,
    ) -> Result<&Position> {
        let symbol = normalize_symbol(symbol)?;
        check_amount("initial investment", initial_investment)?;
        check_amount("current value", current_value)?;

        if self.positions.contains_key(&symbol) {
            return Err(StockError::DuplicatePosition(symbol));
        }

        let position = Position {
            symbol: symbol.clone(),
            initial_investment,
            current_value,
            sector: sector.trim().to_string(),
        };
        Ok(self.positions.entry(symbol).or_insert(position))
    }

    /// Replace the current value of an existing position
    pub fn update(&mut self, symbol: &str, current_value: f64) -> Result<&Position> {
        let symbol = normalize_symbol(symbol)?;
        check_amount("current value", current_value)?;

        let position = self
            .positions
            .get_mut(&symbol)
            .ok_or(StockError::NotFound(symbol))?;
        position.current_value = current_value;
        Ok(position)
    }

    pub fn remove(&mut self, symbol: &str) -> Result<Position> {
        let symbol = normalize_symbol(symbol)?;
        self.positions
            .remove(&symbol)
            .ok_or(StockError::NotFound(symbol))
    }

    /// All positions in symbol order
    pub fn list(&self) -> Vec<&Position> {
        self.positions.values().collect()
    }

    pub fn total_initial(&self) -> f64 {
        self.positions.values().map(|p| p.initial_investment).sum()
    }

    pub fn total_current(&self) -> f64 {
        self.positions.values().map(|p| p.current_value).sum()
    }

    /// Whole-portfolio return on investment, in percent
    pub fn roi(&self) -> Result<f64> {
        let initial = self.total_initial();
        if initial == 0.0 {
            return Err(StockError::InsufficientData(
                "total initial investment is zero".to_string(),
            ));
        }
        Ok((self.total_current() - initial) / initial * 100.0)
    }

    /// `current - initial` per symbol
    pub fn profit_loss(&self) -> Vec<(String, f64)> {
        self.positions
            .values()
            .map(|p| (p.symbol.clone(), p.profit_loss()))
            .collect()
    }

    /// Share of total current value held in each sector
    pub fn sector_weights(&self) -> Result<BTreeMap<String, f64>> {
        let total = self.total_current();
        if total == 0.0 {
            return Err(StockError::InsufficientData(
                "total current value is zero".to_string(),
            ));
        }

        let mut weights = BTreeMap::new();
        for position in self.positions.values() {
            *weights.entry(position.sector.clone()).or_insert(0.0) += position.current_value;
        }
        for weight in weights.values_mut() {
            *weight /= total;
        }
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add("aapl", 1000.0, 1200.0, "Technology").unwrap();
        ledger.add("JNJ", 500.0, 450.0, "Healthcare").unwrap();
        ledger.add("msft", 1500.0, 1350.0, "Technology").unwrap();
        ledger
    }

    #[test]
    fn test_add_list_update_round_trip() {
        let mut ledger = sample();
        let symbols: Vec<&str> = ledger.list().iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "JNJ", "MSFT"]);

        ledger.update("Aapl", 1300.0).unwrap();
        assert_eq!(ledger.get("AAPL").unwrap().current_value, 1300.0);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut ledger = sample();
        let err = ledger.add("AAPL", 1.0, 1.0, "Technology").unwrap_err();
        assert!(matches!(err, StockError::DuplicatePosition(ref s) if s == "AAPL"));
        assert_eq!(ledger.get("AAPL").unwrap().initial_investment, 1000.0);
    }

    #[test]
    fn test_add_validation() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            ledger.add("  ", 1.0, 1.0, "Tech"),
            Err(StockError::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.add("AAPL", -1.0, 1.0, "Tech"),
            Err(StockError::InvalidInput(_))
        ));
        assert!(matches!(
            ledger.add("AAPL", 1.0, f64::NAN, "Tech"),
            Err(StockError::InvalidInput(_))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_missing_symbol_leaves_ledger_untouched() {
        let mut ledger = sample();
        let before = ledger.clone();

        assert!(matches!(
            ledger.update("TSLA", 10.0),
            Err(StockError::NotFound(ref s)) if s == "TSLA"
        ));
        assert!(matches!(ledger.remove("TSLA"), Err(StockError::NotFound(_))));
        assert_eq!(ledger.list(), before.list());
    }

    #[test]
    fn test_remove_returns_position() {
        let mut ledger = sample();
        let removed = ledger.remove("jnj").unwrap();
        assert_eq!(removed.sector, "Healthcare");
        assert!(!ledger.contains("JNJ"));
    }

    #[test]
    fn test_roi() {
        let ledger = sample();
        // (3000 - 3000) / 3000
        assert_eq!(ledger.roi().unwrap(), 0.0);

        let mut ledger = Ledger::new();
        ledger.add("AAPL", 1000.0, 1250.0, "Technology").unwrap();
        assert!((ledger.roi().unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_roi_zero_investment() {
        assert!(matches!(
            Ledger::new().roi(),
            Err(StockError::InsufficientData(_))
        ));

        let mut ledger = Ledger::new();
        ledger.add("FREE", 0.0, 10.0, "Misc").unwrap();
        assert!(matches!(ledger.roi(), Err(StockError::InsufficientData(_))));
    }

    #[test]
    fn test_profit_loss() {
        let pl = sample().profit_loss();
        assert_eq!(
            pl,
            vec![
                ("AAPL".to_string(), 200.0),
                ("JNJ".to_string(), -50.0),
                ("MSFT".to_string(), -150.0),
            ]
        );
    }

    #[test]
    fn test_sector_weights() {
        let weights = sample().sector_weights().unwrap();
        assert!((weights["Technology"] - 0.85).abs() < 1e-9);
        assert!((weights["Healthcare"] - 0.15).abs() < 1e-9);
        assert!((weights.values().sum::<f64>() - 1.0).abs() < 1e-9);

        assert!(matches!(
            Ledger::new().sector_weights(),
            Err(StockError::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_shared_ledger() {
        let shared = sample().shared();
        let other = Arc::clone(&shared);

        tokio::spawn(async move {
            let mut ledger = other.lock().await;
            assert!(ledger.update("MSFT", 1600.0).is_ok());
        })
        .await
        .unwrap();

        assert_eq!(shared.lock().await.get("MSFT").unwrap().current_value, 1600.0);
    }
}
