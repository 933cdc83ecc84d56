//! Stock Advisor CLI
//!
//! An interactive, menu-driven stock analysis assistant.
//!
//! # Usage
//!
//! ```bash
//! # Required
//! export OPENAI_API_KEY="sk-..."
//!
//! # Optional
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//! export OPENAI_MODEL="gpt-4"
//! export ALPHA_VANTAGE_API_KEY="..."   # enables news sentiment
//!
//! cargo run --bin stock-advisor -p advisor-stock
//! ```
//!
//! Variables can also be placed in a `.env` file. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use advisor_llm::LLMProvider;
use advisor_llm::providers::{OpenAIConfig, OpenAIProvider};
use advisor_stock::api::{AlphaVantageClient, MarketDataProvider, SentimentProvider, YahooFinanceClient};
use advisor_stock::shell::Interrupts;
use advisor_stock::{Services, Shell, StockConfig};
use advisor_utils::AppConfig;
use anyhow::Context;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

fn print_banner() {
    println!(
        r"
==================================================
                  Stock Advisor
  Analysis, charts, portfolio, risk and alerts
=================================================="
    );
}

fn sentiment_provider(config: &StockConfig) -> anyhow::Result<Option<Arc<dyn SentimentProvider>>> {
    let Some(key) = config.alpha_vantage_api_key.as_deref() else {
        warn!("ALPHA_VANTAGE_API_KEY not set, news sentiment disabled");
        return Ok(None);
    };

    let client = AlphaVantageClient::new(key, config.alpha_vantage_rate_limit, config.request_timeout)
        .context("failed to create Alpha Vantage client")?;
    Ok(Some(Arc::new(client)))
}

/// Ctrl-C cancels a foreground alert wait; anywhere else it ends the program
fn listen_for_interrupts(interrupts: Interrupts) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !interrupts.deliver() {
                info!("Interrupted, exiting");
                println!("\nGoodbye!");
                std::process::exit(130);
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    advisor_utils::load_env();
    advisor_utils::init_tracing();

    let app = AppConfig::from_env();
    info!(app = %app.app_name, environment = %app.environment, "Starting");

    let config = Arc::new(StockConfig::from_env().context("invalid configuration")?);

    let openai_config = OpenAIConfig::from_env()
        .context("OPENAI_API_KEY is required")?
        .with_timeout(config.llm_timeout.as_secs());
    info!(api_base = %openai_config.api_base, model = %config.model, "Using chat completion API");
    let llm: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::with_config(openai_config)?);

    let market: Arc<dyn MarketDataProvider> = Arc::new(
        YahooFinanceClient::new(config.request_timeout)
            .context("failed to create Yahoo Finance client")?,
    );
    let sentiment = sentiment_provider(&config)?;

    print_banner();

    let interrupts = Interrupts::new();
    listen_for_interrupts(interrupts.clone());

    let services = Services::new(market, sentiment, llm, Arc::clone(&config));
    let stdin = io::stdin();
    let mut shell =
        Shell::new(stdin.lock(), io::stdout(), services).with_interrupts(interrupts);
    shell.run().await?;

    Ok(())
}
