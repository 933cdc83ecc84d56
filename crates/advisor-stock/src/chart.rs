//! ASCII price charts for the terminal

use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::market::MarketDataFetcher;
use crate::model::{Period, PriceHistory};
use tracing::instrument;

const RULE_WIDTH: usize = 50;

/// Every `stride`-th sample, starting with the first
pub fn downsample(series: &[f64], stride: usize) -> Vec<f64> {
    series.iter().step_by(stride.max(1)).copied().collect()
}

/// Plot a series as a line chart `height` rows tall, with a labelled y axis
///
/// Non-finite samples are dropped before plotting.
pub fn render_ascii(series: &[f64], height: usize) -> Result<String> {
    let series: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if series.is_empty() {
        return Err(StockError::InsufficientData(
            "nothing to plot".to_string(),
        ));
    }

    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let ratio = if span > 0.0 { height.max(1) as f64 / span } else { 1.0 };

    // Rows come from the same rounding used to place points, so a chart is
    // always `height` rows above the baseline
    let min_row = (min * ratio).round() as i64;
    let max_row = (max * ratio).round() as i64;
    let rows = usize::try_from(max_row - min_row).unwrap_or(0);

    // Scaled level of a value, 0 at the bottom row
    let level = |v: f64| {
        let scaled = (v * ratio).round() as i64 - min_row;
        usize::try_from(scaled).unwrap_or(0).min(rows)
    };

    let width = series.len().saturating_sub(1).max(1);
    let mut grid = vec![vec![' '; width]; rows + 1];
    let mut axis = vec!['┤'; rows + 1];
    axis[rows - level(series[0])] = '┼';

    if series.len() == 1 {
        grid[rows - level(series[0])][0] = '─';
    }

    for (x, pair) in series.windows(2).enumerate() {
        let (y0, y1) = (level(pair[0]), level(pair[1]));
        if y0 == y1 {
            grid[rows - y0][x] = '─';
            continue;
        }

        let falling = y0 > y1;
        grid[rows - y1][x] = if falling { '╰' } else { '╭' };
        grid[rows - y0][x] = if falling { '╮' } else { '╯' };
        for y in y0.min(y1) + 1..y0.max(y1) {
            grid[rows - y][x] = '│';
        }
    }

    let step = span / rows.max(1) as f64;
    let lines: Vec<String> = grid
        .into_iter()
        .zip(axis)
        .enumerate()
        .map(|(row, (cells, tick))| {
            let label = min + (rows - row) as f64 * step;
            let plot: String = cells.into_iter().collect();
            format!("{label:6.1} {tick}{plot}").trim_end().to_string()
        })
        .collect();

    Ok(lines.join("\n"))
}

/// A rendered chart together with the history it was drawn from
#[derive(Debug, Clone)]
pub struct Chart {
    pub history: PriceHistory,
    pub text: String,
}

/// Fetches history and draws it
pub struct ChartRenderer {
    fetcher: MarketDataFetcher,
    height: usize,
    stride: usize,
}

impl ChartRenderer {
    pub fn new(fetcher: MarketDataFetcher, config: &StockConfig) -> Self {
        Self {
            fetcher,
            height: config.chart_height,
            stride: config.chart_stride,
        }
    }

    #[instrument(skip(self))]
    pub async fn render(&self, symbol: &str, period: Period) -> Result<Chart> {
        let history = self.fetcher.history(symbol, period).await?;
        let text = self.draw(&history)?;
        Ok(Chart { history, text })
    }

    /// Header, rule, plot and start/end footer
    pub fn draw(&self, history: &PriceHistory) -> Result<String> {
        let closes = history.closes();
        let (Some(start), Some(end)) = (closes.first(), closes.last()) else {
            return Err(StockError::InsufficientData(format!(
                "no price history for {}",
                history.symbol
            )));
        };

        let plot = render_ascii(&downsample(&closes, self.stride), self.height)?;
        Ok(format!(
            "{}\n{}\n{plot}\n\nStart: ${start:.1} | End: ${end:.1}",
            history.symbol,
            "-".repeat(RULE_WIDTH)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MarketDataProvider;
    use crate::market::testing::{StubMarket, history_of};
    use std::sync::Arc;

    fn renderer(closes: &[f64]) -> ChartRenderer {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(StubMarket::with_closes(closes));
        let config = StockConfig::default();
        ChartRenderer::new(MarketDataFetcher::new(provider, &config), &config)
    }

    #[test]
    fn test_downsample_every_fifth() {
        let series: Vec<f64> = (0..12).map(f64::from).collect();
        assert_eq!(downsample(&series, 5), vec![0.0, 5.0, 10.0]);
        assert_eq!(downsample(&[7.0, 8.0, 9.0], 5), vec![7.0]);
        assert!(downsample(&[], 5).is_empty());
    }

    #[test]
    fn test_render_height_and_labels() {
        let text = render_ascii(&[10.0, 12.0, 14.0, 16.0, 18.0], 8).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("  18.0"));
        assert!(lines[8].starts_with("  10.0"));
        // first sample sits on the bottom row
        assert!(lines[8].contains('┼'));
    }

    #[test]
    fn test_render_fractional_range() {
        let text = render_ascii(&[10.3, 14.3, 18.3], 8).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("  18.3"));
        assert!(lines[8].starts_with("  10.3"));
        // the peak is drawn on the row labelled with the maximum
        assert!(lines[0].contains('╭'));
        assert!(lines[8].contains('┼'));
    }

    #[test]
    fn test_render_fractional_single_point() {
        let text = render_ascii(&[42.5], 8).unwrap();
        assert_eq!(text, "  42.5 ┼─");
    }

    #[test]
    fn test_render_flat_series() {
        let text = render_ascii(&[5.0, 5.0, 5.0], 8).unwrap();
        assert_eq!(text, "   5.0 ┼──");
    }

    #[test]
    fn test_render_single_point() {
        let text = render_ascii(&[42.0], 8).unwrap();
        assert_eq!(text, "  42.0 ┼─");
    }

    #[test]
    fn test_render_empty_series() {
        assert!(matches!(
            render_ascii(&[], 8),
            Err(StockError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_draw_frames_the_plot() {
        let renderer = renderer(&[]);
        let history = history_of("AAPL", &[100.04, 101.0, 99.5, 103.0, 104.0, 106.27]);
        let text = renderer.draw(&history).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("AAPL"));
        assert_eq!(lines.next(), Some("-".repeat(50).as_str()));
        assert!(text.ends_with("Start: $100.0 | End: $106.3"));
    }

    #[tokio::test]
    async fn test_render_empty_history() {
        let renderer = renderer(&[]);
        assert!(matches!(
            renderer.render("GONE", Period::OneYear).await,
            Err(StockError::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_render_returns_history() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + f64::from(i)).collect();
        let chart = renderer(&closes).render("MSFT", Period::OneMonth).await.unwrap();
        assert_eq!(chart.history.len(), 30);
        assert!(chart.text.starts_with("MSFT\n"));
    }
}
