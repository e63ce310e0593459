//! Check cycle.
//!
//! Entries are processed strictly one at a time. A failure on one entry is
//! reported on the display surface and never stops the rest of the cycle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use notification_service::{format_sample_line, DispatchOutcome, EmailOutcome, NotificationDispatcher};
use watch_core::{evaluate, DisplaySurface, NotificationEvent, StyleHint, WatchEntry, WatchError};
use yahoo_client::{FetchOutcome, PriceFetcher};

use crate::store::WatchlistStore;

/// Bounded retry for price lookups that raised. Empty results are not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 1 disables retry.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Read `PRICE_WATCH_FETCH_ATTEMPTS` / `PRICE_WATCH_FETCH_BACKOFF_MS`.
    pub fn from_env() -> Self {
        let default = Self::default();
        let max_attempts = std::env::var("PRICE_WATCH_FETCH_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.max_attempts);
        let backoff = std::env::var("PRICE_WATCH_FETCH_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(default.backoff);
        Self::new(max_attempts, backoff)
    }
}

/// What happened to one watchlist entry during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Normal { price: f64 },
    Alert(DispatchOutcome),
    NoData,
    LookupFailure(String),
}

/// Per-cycle summary, in watchlist order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub outcomes: Vec<(String, EntryOutcome)>,
}

impl CheckReport {
    pub fn checked(&self) -> usize {
        self.outcomes.len()
    }

    pub fn normal(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Normal { .. }))
    }

    pub fn alerts(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Alert(_)))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::NoData))
    }

    pub fn failures(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::LookupFailure(_)))
    }

    pub fn email_failures(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Alert(d) if matches!(d.email, EmailOutcome::Failed(_))))
    }

    pub fn outcome(&self, symbol: &str) -> Option<&EntryOutcome> {
        self.outcomes.iter().find(|(s, _)| s == symbol).map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct CheckCycleOrchestrator {
    fetcher: PriceFetcher,
    dispatcher: NotificationDispatcher,
    surface: Arc<dyn DisplaySurface>,
    retry: RetryPolicy,
}

impl CheckCycleOrchestrator {
    pub fn new(
        fetcher: PriceFetcher,
        dispatcher: NotificationDispatcher,
        surface: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            fetcher,
            dispatcher,
            surface,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one full pass over the watchlist.
    pub async fn run_check(&self, store: &WatchlistStore) -> CheckReport {
        let mut report = CheckReport::default();

        if store.is_empty() {
            self.surface
                .write_line("Watchlist is empty; add a symbol first", StyleHint::Plain);
            return report;
        }

        info!("Checking {} watchlist entries", store.len());
        for entry in store.all() {
            let outcome = self.check_entry(entry).await;
            report.outcomes.push((entry.symbol.clone(), outcome));
        }

        info!(
            "Check complete: {} checked, {} alerts, {} normal, {} no data, {} failed, {} email failures",
            report.checked(),
            report.alerts(),
            report.normal(),
            report.no_data(),
            report.failures(),
            report.email_failures()
        );
        report
    }

    async fn check_entry(&self, entry: &WatchEntry) -> EntryOutcome {
        let outcome = self.fetch_with_retry(&entry.symbol).await;
        if let Some(err) = outcome.error(&entry.symbol) {
            warn!("{}", err);
            self.report(&err);
        }

        let sample = match outcome {
            FetchOutcome::Found(sample) => sample,
            FetchOutcome::NoData => return EntryOutcome::NoData,
            FetchOutcome::LookupFailure(reason) => return EntryOutcome::LookupFailure(reason),
        };

        let condition = evaluate(sample.price, entry.upper_bound, entry.lower_bound);
        debug!("{} {:.2} ({}) -> {}", sample.symbol, sample.price, sample.granularity, condition);

        match NotificationEvent::from_sample(&sample, condition) {
            Some(event) => EntryOutcome::Alert(self.dispatcher.dispatch(&event).await),
            None => {
                self.surface
                    .write_line(&format_sample_line(&sample, &condition), StyleHint::Plain);
                EntryOutcome::Normal { price: sample.price }
            }
        }
    }

    async fn fetch_with_retry(&self, symbol: &str) -> FetchOutcome {
        let mut attempt = 1;
        loop {
            let outcome = self.fetcher.fetch(symbol).await;
            if let FetchOutcome::LookupFailure(reason) = &outcome {
                if attempt < self.retry.max_attempts {
                    warn!(
                        "{} lookup failed ({}), retry {}/{}",
                        symbol,
                        reason,
                        attempt,
                        self.retry.max_attempts - 1
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                    continue;
                }
            }
            return outcome;
        }
    }

    fn report(&self, err: &WatchError) {
        self.surface.write_line(&err.to_string(), err.severity().into());
    }
}
