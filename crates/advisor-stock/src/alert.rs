//! Background price alerts
//!
//! Each alert runs as its own tokio task that polls the live price until the
//! target is crossed, the alert is cancelled, or the optional timeout elapses.

use crate::api::MarketDataProvider;
use crate::config::StockConfig;
use crate::error::StockError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Which side of the target fires the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Above,
    Below,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Above => f.write_str("above"),
            Self::Below => f.write_str("below"),
        }
    }
}

impl FromStr for AlertDirection {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            other => Err(StockError::InvalidInput(format!(
                "direction must be 'above' or 'below', got '{other}'"
            ))),
        }
    }
}

/// A price target for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub ticker: String,
    pub target: f64,
    pub direction: AlertDirection,
}

impl PriceAlert {
    pub fn new(ticker: impl Into<String>, target: f64, direction: AlertDirection) -> Self {
        Self {
            ticker: ticker.into(),
            target,
            direction,
        }
    }

    /// Whether `price` satisfies the alert (inclusive)
    pub fn is_triggered(&self, price: f64) -> bool {
        match self.direction {
            AlertDirection::Above => price >= self.target,
            AlertDirection::Below => price <= self.target,
        }
    }

    /// Notification text for a triggering price
    pub fn message(&self, price: f64) -> String {
        match self.direction {
            AlertDirection::Above => format!(
                "Alert: {} has reached {:.2}, above target {:.2}",
                self.ticker, price, self.target
            ),
            AlertDirection::Below => format!(
                "Alert: {} has dropped to {:.2}, below target {:.2}",
                self.ticker, price, self.target
            ),
        }
    }
}

/// How a watcher finished
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertOutcome {
    Triggered { price: f64 },
    Cancelled,
    TimedOut,
}

/// Spawns alert tasks against a market data provider
#[derive(Clone)]
pub struct AlertWatcher {
    provider: Arc<dyn MarketDataProvider>,
    poll_interval: Duration,
    timeout: Option<Duration>,
    request: RetryPolicy,
}

impl AlertWatcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &StockConfig) -> Self {
        Self {
            provider,
            poll_interval: config.alert_poll_interval,
            timeout: config.alert_timeout,
            // The poll loop is the retry; each fetch only needs a deadline
            request: RetryPolicy::no_retry(config.request_timeout),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start watching; the first poll happens immediately
    pub fn spawn(&self, alert: PriceAlert) -> AlertHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let watcher = self.clone();
        let task_alert = alert.clone();
        let task = tokio::spawn(async move {
            let outcome = watcher.run(&task_alert, stop_rx).await;
            info!("Alert for {} finished: {:?}", task_alert.ticker, outcome);
            // The handle may already be gone
            let _ = outcome_tx.send(outcome);
        });

        AlertHandle {
            alert,
            stop: stop_tx,
            outcome: outcome_rx,
            finished: None,
            task,
        }
    }

    async fn run(&self, alert: &PriceAlert, mut stop: watch::Receiver<bool>) -> AlertOutcome {
        let stopped = async move {
            // Err means the handle was dropped, which also ends the watch
            let _ = stop.wait_for(|stopped| *stopped).await;
        };

        match self.timeout {
            Some(limit) => tokio::select! {
                biased;
                () = stopped => AlertOutcome::Cancelled,
                polled = tokio::time::timeout(limit, self.poll_until_triggered(alert)) => {
                    polled.unwrap_or(AlertOutcome::TimedOut)
                }
            },
            None => tokio::select! {
                biased;
                () = stopped => AlertOutcome::Cancelled,
                outcome = self.poll_until_triggered(alert) => outcome,
            },
        }
    }

    async fn poll_until_triggered(&self, alert: &PriceAlert) -> AlertOutcome {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let fetched = self
                .request
                .execute("live_price", || self.provider.live_price(&alert.ticker))
                .await;

            match fetched {
                Ok(price) if alert.is_triggered(price) => {
                    return AlertOutcome::Triggered { price };
                }
                Ok(price) => debug!(
                    "{} at {:.2}, waiting for {} {:.2}",
                    alert.ticker, price, alert.direction, alert.target
                ),
                Err(e) => warn!("Price check for {} failed: {}", alert.ticker, e),
            }
        }
    }
}

/// Control and result side of a running alert
pub struct AlertHandle {
    alert: PriceAlert,
    stop: watch::Sender<bool>,
    outcome: oneshot::Receiver<AlertOutcome>,
    finished: Option<AlertOutcome>,
    task: JoinHandle<()>,
}

impl AlertHandle {
    pub fn alert(&self) -> &PriceAlert {
        &self.alert
    }

    /// Ask the watcher to stop; a no-op once it has finished
    pub fn cancel(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some() || self.task.is_finished()
    }

    /// Wait for the watcher to finish
    ///
    /// Safe to use inside `select!`; a dropped wait loses nothing.
    pub async fn wait(&mut self) -> AlertOutcome {
        if let Some(outcome) = self.finished {
            return outcome;
        }
        // A closed channel means the task died without reporting
        let outcome = (&mut self.outcome).await.unwrap_or(AlertOutcome::Cancelled);
        self.finished = Some(outcome);
        outcome
    }

    /// The outcome if the watcher has already finished
    pub fn try_outcome(&mut self) -> Option<AlertOutcome> {
        if self.finished.is_none() {
            match self.outcome.try_recv() {
                Ok(outcome) => self.finished = Some(outcome),
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.finished = Some(AlertOutcome::Cancelled);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.finished
    }

    /// Wait for the watcher and consume the handle
    pub async fn outcome(mut self) -> AlertOutcome {
        self.wait().await
    }

    /// User-facing line for a finished alert
    pub fn describe(&self, outcome: AlertOutcome) -> String {
        match outcome {
            AlertOutcome::Triggered { price } => self.alert.message(price),
            AlertOutcome::Cancelled => format!(
                "Alert for {} ({} {:.2}) cancelled",
                self.alert.ticker, self.alert.direction, self.alert.target
            ),
            AlertOutcome::TimedOut => format!(
                "Alert for {} ({} {:.2}) timed out before the target was reached",
                self.alert.ticker, self.alert.direction, self.alert.target
            ),
        }
    }
}
