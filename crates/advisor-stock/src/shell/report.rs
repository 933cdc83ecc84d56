//! Tables and summaries for the portfolio screens

use crate::portfolio::Ledger;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{CellAlignment, Table};
use std::fmt::Write as _;

const RULE: &str = "==================================================";

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_header(header);
    table
}

fn align_numeric_columns(table: &mut Table, from: usize) {
    for index in from..table.column_count() {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

/// Every position with its amounts
pub fn positions_table(ledger: &Ledger) -> Table {
    let mut table = table(vec!["Symbol", "Initial Investment", "Current Value", "Sector"]);
    for position in ledger.list() {
        table.add_row(vec![
            position.symbol.clone(),
            format!("{:.2}", position.initial_investment),
            format!("{:.2}", position.current_value),
            position.sector.clone(),
        ]);
    }
    align_numeric_columns(&mut table, 1);
    table
}

/// ROI, per-position profit/loss and sector weights
pub fn analytics(ledger: &Ledger) -> String {
    let mut out = String::new();

    let roi = ledger
        .roi()
        .map_or_else(|e| format!("N/A ({e})"), |roi| format!("{roi:.2}%"));

    let mut pl = table(vec!["Symbol", "Profit/Loss"]);
    for (symbol, amount) in ledger.profit_loss() {
        pl.add_row(vec![symbol, format!("{amount:.2}")]);
    }
    align_numeric_columns(&mut pl, 1);

    let weights = match ledger.sector_weights() {
        Ok(weights) => {
            let mut table = table(vec!["Sector", "Weight"]);
            for (sector, weight) in weights {
                let sector = if sector.is_empty() { "-".to_string() } else { sector };
                table.add_row(vec![sector, format!("{:.2}%", weight * 100.0)]);
            }
            align_numeric_columns(&mut table, 1);
            table.to_string()
        }
        Err(e) => format!("N/A ({e})"),
    };

    // Writing to a String cannot fail
    let _ = writeln!(out, "\nPortfolio Analytics:\n{RULE}");
    let _ = writeln!(out, "Portfolio ROI: {roi}");
    let _ = writeln!(out, "\nProfit/Loss by Position:\n{pl}");
    let _ = writeln!(out, "\nSector Weights:\n{weights}");
    let _ = write!(out, "{RULE}");
    out
}
