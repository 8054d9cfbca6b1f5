use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::AlertError;
use crate::feed::PriceFeed;
use crate::models::Alert;
use crate::services::distance::percent_distance;
use crate::services::evaluator::{self, Evaluation};
use crate::services::lifecycle::Lifecycle;

/// Consecutive failed passes before the retry warning escalates to an error.
const STORE_FAILURE_ALARM_PASSES: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Active alerts listed at the start of the pass.
    pub alerts: usize,
    /// Distinct codes among them.
    pub codes: usize,
    /// Codes skipped because the feed had no usable price.
    pub skipped_codes: usize,
    /// Alerts actually evaluated against a price.
    pub evaluated: usize,
    /// Active -> Historical transitions performed this pass.
    pub triggered: usize,
}

impl PassSummary {
    fn absorb(&mut self, other: PassSummary) {
        self.skipped_codes += other.skipped_codes;
        self.evaluated += other.evaluated;
        self.triggered += other.triggered;
    }
}

/// Periodic scan over every Active alert. Each pass reads the store fresh,
/// fetches one price per distinct code, and reports met conditions to the
/// lifecycle manager. Alerts for the same code sit in the same group and are
/// evaluated sequentially, so no two writes for one alert can race inside a
/// pass.
pub struct AlertMonitor {
    lifecycle: Lifecycle,
    feed: Arc<dyn PriceFeed>,
    interval: Duration,
    fetch_concurrency: usize,
}

impl AlertMonitor {
    pub fn new(
        lifecycle: Lifecycle,
        feed: Arc<dyn PriceFeed>,
        interval: Duration,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            lifecycle,
            feed,
            interval,
            fetch_concurrency: fetch_concurrency.max(1),
        }
    }

    /// Runs the scan loop until `shutdown` flips to true (or its sender is
    /// dropped). An in-flight pass always finishes; the signal is only
    /// observed between passes.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        // A slow pass must not cause a burst of catch-up passes.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            fetch_concurrency = self.fetch_concurrency,
            "alert monitor started"
        );

        let mut failed_passes: u32 = 0;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_pass().await {
                        Ok(summary) => {
                            failed_passes = 0;
                            tracing::debug!(
                                alerts = summary.alerts,
                                codes = summary.codes,
                                skipped_codes = summary.skipped_codes,
                                evaluated = summary.evaluated,
                                triggered = summary.triggered,
                                "scan pass complete"
                            );
                        }
                        Err(e) => {
                            failed_passes += 1;
                            if failed_passes >= STORE_FAILURE_ALARM_PASSES {
                                tracing::error!(failed_passes, error = %e, "scan pass failed; still retrying");
                            } else {
                                tracing::warn!(failed_passes, error = %e, "scan pass failed; will retry");
                            }
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("alert monitor stopped");
    }

    /// One full scan. Feed trouble for a code skips just that code; a store
    /// failure aborts the whole pass and surfaces as the error.
    pub async fn run_pass(&self) -> Result<PassSummary, AlertError> {
        let alerts = self.lifecycle.list_active().await?;
        if alerts.is_empty() {
            return Ok(PassSummary::default());
        }

        let mut by_code: HashMap<String, Vec<Alert>> = HashMap::new();
        for a in alerts {
            by_code.entry(a.code.clone()).or_default().push(a);
        }

        let mut summary = PassSummary {
            alerts: by_code.values().map(Vec::len).sum(),
            codes: by_code.len(),
            ..PassSummary::default()
        };

        let now = Utc::now().timestamp();
        let mut scans = futures_util::stream::iter(by_code)
            .map(|(code, group)| self.scan_code(code, group, now))
            .buffer_unordered(self.fetch_concurrency);

        while let Some(res) = scans.next().await {
            summary.absorb(res?);
        }

        Ok(summary)
    }

    async fn scan_code(
        &self,
        code: String,
        group: Vec<Alert>,
        now: i64,
    ) -> Result<PassSummary, AlertError> {
        let mut summary = PassSummary::default();

        let price = match self.feed.latest_price(&code).await {
            Ok(Some(price)) => price,
            Ok(None) => {
                tracing::debug!(code, "no usable quote; skipping code");
                summary.skipped_codes = 1;
                return Ok(summary);
            }
            Err(e) => {
                tracing::warn!(code, error = %e, "price fetch failed; skipping code");
                summary.skipped_codes = 1;
                return Ok(summary);
            }
        };

        for alert in &group {
            summary.evaluated += 1;
            match evaluator::evaluate(alert, Some(price)) {
                Evaluation::Met => {
                    if self.lifecycle.condition_met(alert, price, now).await? {
                        summary.triggered += 1;
                    }
                }
                Evaluation::NotMet => {
                    tracing::debug!(
                        id = %alert.id,
                        code,
                        price,
                        distance_pct = percent_distance(alert, price),
                        "condition not met"
                    );
                }
                Evaluation::Indeterminate => {}
            }
        }

        Ok(summary)
    }
}
