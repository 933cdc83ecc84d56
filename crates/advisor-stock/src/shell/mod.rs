//! Interactive menu shell
//!
//! The shell reads from any `BufRead` and writes to any `Write`, so a whole
//! session can be scripted in tests. Price alerts keep running in the
//! background between menu selections and are reported when they finish.

mod interrupt;
mod menu;
mod prompt;
mod report;

pub use interrupt::Interrupts;
pub use menu::{MainChoice, PortfolioChoice};
pub use prompt::{
    Prompter, parse_amount, parse_direction, parse_number, parse_period, parse_positive,
    parse_risk_pct, parse_ticker, parse_yes_no,
};

use crate::alert::{AlertHandle, AlertWatcher, PriceAlert};
use crate::api::{MarketDataProvider, SentimentProvider};
use crate::chart::ChartRenderer;
use crate::config::StockConfig;
use crate::error::StockError;
use crate::market::MarketDataFetcher;
use crate::model::Period;
use crate::portfolio::Ledger;
use crate::recommendation::RecommendationEngine;
use crate::retry::RetryPolicy;
use crate::risk::RiskSizer;
use crate::sentiment::SentimentScorer;
use advisor_llm::LLMProvider;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::warn;

const RULE: &str = "==================================================";
const TICKER_PROMPT: &str = "Enter stock ticker symbol (e.g. AAPL): ";
const TICKER_RETRY: &str = "Invalid ticker symbol. Please enter a valid stock symbol (1-5 letters).";
const YES_NO_RETRY: &str = "Invalid input. Please enter 'y' for yes or 'n' for no.";

/// Components the shell dispatches to
pub struct Services {
    pub recommender: RecommendationEngine,
    pub charts: ChartRenderer,
    pub risk: RiskSizer,
    pub alerts: AlertWatcher,
}

impl Services {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        sentiment: Option<Arc<dyn SentimentProvider>>,
        llm: Arc<dyn LLMProvider>,
        config: Arc<StockConfig>,
    ) -> Self {
        let fetcher = MarketDataFetcher::new(Arc::clone(&market), &config);
        let scorer = sentiment
            .map(|provider| SentimentScorer::new(provider, RetryPolicy::from_config(&config)));

        Self {
            charts: ChartRenderer::new(fetcher.clone(), &config),
            risk: RiskSizer::new(fetcher.clone()),
            alerts: AlertWatcher::new(market, &config),
            recommender: RecommendationEngine::new(fetcher, scorer, llm, config),
        }
    }
}

/// Whether the session should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Result of asking for a symbol already in the ledger
enum Pick {
    Found(String),
    Skip,
    EndOfInput,
}

/// Unwrap a prompt answer, ending the session at end of input
macro_rules! answer {
    ($e:expr) => {
        match $e? {
            Some(value) => value,
            None => return Ok(Flow::Exit),
        }
    };
}

/// Failures that mean the ticker has no usable data
fn is_unknown_ticker(error: &StockError) -> bool {
    matches!(
        error,
        StockError::InsufficientData(_)
            | StockError::InvalidSymbol(_)
            | StockError::DataUnavailable { .. }
    )
}

pub struct Shell<R, W> {
    prompter: Prompter<R, W>,
    services: Services,
    ledger: Ledger,
    alerts: Vec<AlertHandle>,
    interrupts: Interrupts,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W, services: Services) -> Self {
        Self {
            prompter: Prompter::new(input, output),
            services,
            ledger: Ledger::new(),
            alerts: Vec::new(),
            interrupts: Interrupts::new(),
        }
    }

    /// Let Ctrl-C cancel a foreground alert wait
    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = interrupts;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_output(self) -> W {
        self.prompter.into_output()
    }

    /// Run the menu loop until Exit or end of input
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.report_finished_alerts()?;
            self.prompter.say(MainChoice::MENU)?;

            let Some(answer) = self.prompter.line(MainChoice::PROMPT)? else {
                break;
            };

            let flow = match MainChoice::parse(&answer) {
                Some(MainChoice::PortfolioAnalytics) => self.portfolio_analytics()?,
                Some(MainChoice::AnalyzeStock) => self.analyze_stock().await?,
                Some(MainChoice::ManagePortfolio) => self.manage_portfolio()?,
                Some(MainChoice::RiskManagement) => self.risk_management().await?,
                Some(MainChoice::PriceAlerts) => self.price_alert().await?,
                Some(MainChoice::Exit) => Flow::Exit,
                None => {
                    self.prompter.say(MainChoice::INVALID)?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.shutdown()
    }

    fn shutdown(&mut self) -> io::Result<()> {
        let pending: Vec<AlertHandle> = self
            .alerts
            .drain(..)
            .filter(|handle| !handle.is_finished())
            .collect();

        for handle in &pending {
            handle.cancel();
        }
        if !pending.is_empty() {
            self.prompter
                .say(format!("Cancelled {} pending price alert(s).", pending.len()))?;
        }

        self.prompter.say("Goodbye!")
    }

    fn report_finished_alerts(&mut self) -> io::Result<()> {
        let mut finished = Vec::new();
        self.alerts.retain_mut(|handle| match handle.try_outcome() {
            Some(outcome) => {
                finished.push(handle.describe(outcome));
                false
            }
            None => true,
        });

        for message in finished {
            self.prompter.say(message)?;
        }
        Ok(())
    }

    fn portfolio_analytics(&mut self) -> io::Result<Flow> {
        if self.ledger.is_empty() {
            self.prompter
                .say("Portfolio is empty. Please add positions first.")?;
        } else {
            self.prompter.say(report::analytics(&self.ledger))?;
        }
        Ok(Flow::Continue)
    }

    async fn analyze_stock(&mut self) -> io::Result<Flow> {
        let ticker = answer!(self.prompter.ask(TICKER_PROMPT, TICKER_RETRY, parse_ticker));
        let holding = answer!(self.prompter.ask(
            "Are you holding this stock? (y/n): ",
            YES_NO_RETRY,
            parse_yes_no
        ));

        let include_sentiment = if self.services.recommender.has_sentiment() {
            answer!(self.prompter.ask(
                "Include market sentiment analysis? (y/n): ",
                YES_NO_RETRY,
                parse_yes_no
            ))
        } else {
            self.prompter.say(
                "Market sentiment is unavailable (set ALPHA_VANTAGE_API_KEY to enable it).",
            )?;
            false
        };

        let period_prompt = format!(
            "Enter the time period for the stock analysis ({}): ",
            Period::choices()
        );
        let period_retry = format!(
            "Invalid time period. Please choose from: {}",
            Period::ALL.map(Period::as_str).join(", ")
        );
        let period = answer!(self.prompter.ask(&period_prompt, &period_retry, parse_period));

        self.prompter.say(format!("\nAnalyzing {ticker}..."))?;
        let recommendation = match self
            .services
            .recommender
            .analyze(&ticker, holding, include_sentiment)
            .await
        {
            Ok(recommendation) => recommendation,
            Err(e) if is_unknown_ticker(&e) => {
                warn!("No data for {}: {}", ticker, e);
                self.prompter.say(format!(
                    "The ticker '{ticker}' does not exist. Please try again with a valid stock symbol."
                ))?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                warn!("Analysis of {} failed: {}", ticker, e);
                self.prompter
                    .say(format!("Analysis failed for {ticker}: {e}"))?;
                return Ok(Flow::Continue);
            }
        };

        self.prompter.say(format!(
            "\nFinancial Analysis for {ticker}:\n{RULE}\n{}\n{RULE}",
            recommendation.analysis
        ))?;

        match self.services.charts.render(&ticker, period).await {
            Ok(chart) => self.prompter.say(format!("\n{}", chart.text))?,
            Err(e) => self.prompter.say(format!("Chart unavailable: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    fn manage_portfolio(&mut self) -> io::Result<Flow> {
        loop {
            self.prompter.say(PortfolioChoice::MENU)?;
            let Some(answer) = self.prompter.line(PortfolioChoice::PROMPT)? else {
                return Ok(Flow::Exit);
            };

            let flow = match PortfolioChoice::parse(&answer) {
                Some(PortfolioChoice::Add) => self.add_position()?,
                Some(PortfolioChoice::Update) => self.update_position()?,
                Some(PortfolioChoice::Remove) => self.remove_position()?,
                Some(PortfolioChoice::View) => self.view_portfolio()?,
                Some(PortfolioChoice::Back) => return Ok(Flow::Continue),
                None => {
                    self.prompter.say(PortfolioChoice::INVALID)?;
                    Flow::Continue
                }
            };

            if flow == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
    }

    fn add_position(&mut self) -> io::Result<Flow> {
        let symbol = answer!(self.prompter.ask(
            "Enter stock symbol: ",
            TICKER_RETRY,
            parse_ticker
        ));
        let initial = answer!(self.prompter.ask(
            "Enter initial investment amount: ",
            "Please enter a valid non-negative number.",
            parse_amount
        ));
        let current = answer!(self.prompter.ask(
            "Enter current value: ",
            "Please enter a valid non-negative number.",
            parse_amount
        ));
        let sector = answer!(self
            .prompter
            .line("Enter sector (e.g., Technology, Healthcare): "));

        match self.ledger.add(&symbol, initial, current, &sector) {
            Ok(_) => self.prompter.say("Position added successfully!")?,
            Err(StockError::DuplicatePosition(symbol)) => self.prompter.say(format!(
                "{symbol} is already in the portfolio. Use Update Position to change it."
            ))?,
            Err(e) => self.prompter.say(format!("Could not add position: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    /// Show current positions and ask which one to act on
    fn pick_existing(&mut self, empty_message: &str, prompt: &str) -> io::Result<Pick> {
        if self.ledger.is_empty() {
            self.prompter.say(empty_message)?;
            return Ok(Pick::Skip);
        }

        let table = report::positions_table(&self.ledger);
        self.prompter.say(format!("\nCurrent positions:\n{table}"))?;

        let Some(symbol) = self.prompter.line(prompt)? else {
            return Ok(Pick::EndOfInput);
        };
        let symbol = symbol.to_ascii_uppercase();
        if self.ledger.contains(&symbol) {
            Ok(Pick::Found(symbol))
        } else {
            self.prompter.say("Symbol not found in portfolio.")?;
            Ok(Pick::Skip)
        }
    }

    fn update_position(&mut self) -> io::Result<Flow> {
        let symbol = match self.pick_existing("No positions to update.", "Enter symbol to update: ")? {
            Pick::Found(symbol) => symbol,
            Pick::Skip => return Ok(Flow::Continue),
            Pick::EndOfInput => return Ok(Flow::Exit),
        };

        let value = answer!(self.prompter.ask(
            "Enter new current value: ",
            "Please enter a valid non-negative number.",
            parse_amount
        ));

        match self.ledger.update(&symbol, value) {
            Ok(_) => self.prompter.say("Position updated successfully!")?,
            Err(e) => self.prompter.say(format!("Could not update position: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    fn remove_position(&mut self) -> io::Result<Flow> {
        let symbol = match self.pick_existing("No positions to remove.", "Enter symbol to remove: ")? {
            Pick::Found(symbol) => symbol,
            Pick::Skip => return Ok(Flow::Continue),
            Pick::EndOfInput => return Ok(Flow::Exit),
        };

        match self.ledger.remove(&symbol) {
            Ok(_) => self.prompter.say("Position removed successfully!")?,
            Err(e) => self.prompter.say(format!("Could not remove position: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    fn view_portfolio(&mut self) -> io::Result<Flow> {
        if self.ledger.is_empty() {
            self.prompter.say("Portfolio is empty.")?;
        } else {
            let table = report::positions_table(&self.ledger);
            self.prompter.say(format!("\nCurrent Portfolio:\n{table}"))?;
        }
        Ok(Flow::Continue)
    }

    async fn risk_management(&mut self) -> io::Result<Flow> {
        let ticker = answer!(self.prompter.ask(TICKER_PROMPT, TICKER_RETRY, parse_ticker));
        let account = answer!(self.prompter.ask(
            "Enter your account size: ",
            "Please enter a valid positive number.",
            parse_positive
        ));
        let risk = answer!(self.prompter.ask(
            "Enter risk percentage (1-100): ",
            "Risk percentage must be a number above 0 and at most 100.",
            parse_risk_pct
        ));

        match self.services.risk.size(&ticker, account, risk).await {
            Ok(size) => self.prompter.say(format!(
                "\nPosition Size Analysis:\n\
                 Daily Volatility: {:.2}%\n\
                 Current Price: ${:.2}\n\
                 Suggested Position Size: ${:.2}\n\
                 Maximum Shares: {}",
                size.daily_volatility * 100.0,
                size.current_price,
                size.suggested_position,
                size.max_shares
            ))?,
            Err(e) => self
                .prompter
                .say(format!("Error calculating position size: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    async fn price_alert(&mut self) -> io::Result<Flow> {
        let ticker = answer!(self.prompter.ask(TICKER_PROMPT, TICKER_RETRY, parse_ticker));
        let target = answer!(self.prompter.ask(
            "Enter target price: ",
            "Please enter a valid positive number.",
            parse_positive
        ));
        let direction = answer!(self.prompter.ask(
            "Alert when price goes 'above' or 'below' target? ",
            "Please enter either 'above' or 'below'.",
            parse_direction
        ));

        self.prompter
            .say(format!("\nSetting price alert for {ticker}..."))?;
        let mut handle = self
            .services
            .alerts
            .spawn(PriceAlert::new(ticker.as_str(), target, direction));

        let wait = answer!(self.prompter.ask(
            "Wait for the alert now? (y/n): ",
            YES_NO_RETRY,
            parse_yes_no
        ));

        if !wait {
            self.prompter.say(format!(
                "Watching {ticker} in the background; you'll be told here when the alert finishes."
            ))?;
            self.alerts.push(handle);
            return Ok(Flow::Continue);
        }

        self.prompter.say(format!(
            "Waiting for {ticker} to go {direction} {target:.2} (press Ctrl-C to cancel)..."
        ))?;

        let mut foreground = self.interrupts.foreground();
        let outcome = tokio::select! {
            outcome = handle.wait() => outcome,
            () = foreground.interrupted() => {
                handle.cancel();
                handle.wait().await
            }
        };
        drop(foreground);
        self.prompter.say(handle.describe(outcome))?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::testing::StubMarket;
    use crate::model::QuoteFields;
    use crate::recommendation::testing::StubLlm;
    use std::io::Cursor;

    fn services(market: StubMarket) -> Services {
        let market: Arc<dyn MarketDataProvider> = Arc::new(market);
        let llm: Arc<dyn LLMProvider> = Arc::new(StubLlm::replying(
            "Apple Inc. (Technology). Recommendation: Hold. Conclusion: hold for now.",
        ));
        Services::new(market, None, llm, Arc::new(StockConfig::default()))
    }

    async fn session(script: &str, market: StubMarket) -> (String, Ledger) {
        let mut shell = Shell::new(Cursor::new(script.to_string()), Vec::new(), services(market));
        shell.run().await.unwrap();
        let ledger = shell.ledger().clone();
        let output = String::from_utf8(shell.into_output()).unwrap();
        (output, ledger)
    }

    fn priced_market() -> StubMarket {
        let mut market = StubMarket::with_closes(&[100.0, 102.0, 101.0, 104.0, 103.0, 106.0, 108.0]);
        market.fields = QuoteFields {
            company_name: Some("Apple Inc.".to_string()),
            current_price: Some(108.0),
            ..Default::default()
        };
        market
    }

    #[tokio::test]
    async fn test_portfolio_session() {
        let script = "3\n1\naapl\n1000\n1200\nTechnology\n1\nAAPL\n5\n5\n\n2\naapl\n1300\n4\n5\n1\n6\n";
        let (output, ledger) = session(script, StubMarket::default()).await;

        assert!(output.contains("Position added successfully!"));
        assert!(output.contains("AAPL is already in the portfolio."));
        assert!(output.contains("Position updated successfully!"));
        assert!(output.contains("Current Portfolio:"));
        assert!(output.contains("Portfolio ROI: 30.00%"));
        assert!(output.ends_with("Goodbye!\n"));
        assert_eq!(ledger.get("AAPL").unwrap().current_value, 1300.0);
    }

    #[tokio::test]
    async fn test_remove_unknown_symbol() {
        let script = "3\n1\nmsft\n10\n12\nTech\n3\ntsla\n3\nmsft\n4\n5\n6\n";
        let (output, ledger) = session(script, StubMarket::default()).await;

        assert!(output.contains("Symbol not found in portfolio."));
        assert!(output.contains("Position removed successfully!"));
        assert!(output.contains("Portfolio is empty."));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_choices_reprompt() {
        let (output, _) = session("9\n3\n0\n5\n6\n", StubMarket::default()).await;
        assert!(output.contains("Invalid choice. Please enter 1-6."));
        assert!(output.contains("Invalid choice. Please enter 1-5."));
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_empty_portfolio_analytics() {
        let (output, _) = session("1\n6\n", StubMarket::default()).await;
        assert!(output.contains("Portfolio is empty. Please add positions first."));
    }

    #[tokio::test]
    async fn test_eof_exits_cleanly() {
        let (output, _) = session("", StubMarket::default()).await;
        assert!(output.ends_with("Goodbye!\n"));

        // End of input in the middle of a prompt also exits
        let (output, _) = session("2\nmsft\n", StubMarket::default()).await;
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_analyze_session() {
        let script = "2\nGOOGLE\naapl\nmaybe\ny\n10y\n1mo\n6\n";
        let (output, _) = session(script, priced_market()).await;

        assert!(output.contains("Invalid ticker symbol."));
        assert!(output.contains("Invalid input. Please enter 'y' for yes or 'n' for no."));
        assert!(output.contains("Invalid time period. Please choose from: 1d, 5d, 1mo"));
        assert!(output.contains("Market sentiment is unavailable"));
        assert!(output.contains("Financial Analysis for AAPL:"));
        assert!(output.contains("Recommendation: Hold."));
        assert!(output.contains("Start: $100.0 | End: $108.0"));
    }

    #[tokio::test]
    async fn test_analyze_unknown_ticker() {
        let (output, _) = session("2\nzzzz\nn\n1y\n6\n", StubMarket::with_closes(&[])).await;
        assert!(output.contains(
            "The ticker 'ZZZZ' does not exist. Please try again with a valid stock symbol."
        ));
    }

    #[tokio::test]
    async fn test_risk_session() {
        let script = "4\naapl\n-5\n10000\n0\n2\n6\n";
        let (output, _) = session(script, priced_market()).await;

        assert!(output.contains("Please enter a valid positive number."));
        assert!(output.contains("Risk percentage must be a number above 0 and at most 100."));
        assert!(output.contains("Position Size Analysis:"));
        assert!(output.contains("Current Price: $108.00"));
        assert!(output.contains("Maximum Shares: 2"));
    }

    #[tokio::test]
    async fn test_alert_wait_triggers() {
        let script = "5\naapl\n100\nsideways\nabove\ny\n6\n";
        let (output, _) = session(script, StubMarket::with_live_prices(&[150.0])).await;

        assert!(output.contains("Please enter either 'above' or 'below'."));
        assert!(output.contains("Alert: AAPL has reached 150.00, above target 100.00"));
    }

    #[tokio::test]
    async fn test_background_alert_cancelled_on_exit() {
        let script = "5\naapl\n200\nabove\nn\n6\n";
        let (output, _) = session(script, StubMarket::with_live_prices(&[150.0])).await;

        assert!(output.contains("Watching AAPL in the background"));
        assert!(output.contains("Cancelled 1 pending price alert(s)."));
    }

    #[tokio::test]
    async fn test_interrupt_cancels_foreground_wait() {
        let interrupts = Interrupts::new();
        let script = "5
aapl
200
above
y
6
";
        let mut shell = Shell::new(
            Cursor::new(script.to_string()),
            Vec::new(),
            services(StubMarket::with_live_prices(&[150.0])),
        )
        .with_interrupts(interrupts.clone());

        // Nothing is waiting yet, so keep trying until the shell takes it
        let sender = tokio::spawn(async move {
            while !interrupts.deliver() {
                tokio::task::yield_now().await;
            }
            interrupts
        });

        shell.run().await.unwrap();
        let interrupts = sender.await.unwrap();
        let output = String::from_utf8(shell.into_output()).unwrap();

        assert!(output.contains("Alert for AAPL (above 200.00) cancelled"));
        assert!(output.ends_with("Goodbye!\n"));
        // Once the wait is over, interrupts go back to ending the session
        assert!(!interrupts.deliver());
    }
}
