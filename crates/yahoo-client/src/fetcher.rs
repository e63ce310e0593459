//! Latest-price lookup with daily fallback.
//!
//! Intraday history is empty outside trading hours, so when the minute series
//! comes back empty the fetcher falls back to the last few daily closes.

use std::sync::Arc;
use tracing::debug;
use watch_core::{Granularity, Period, PricePoint, PriceSample, PriceSource, WatchError};

/// Outcome of fetching the latest price for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(PriceSample),
    /// Both the intraday and the daily query came back empty.
    NoData,
    /// The price source raised (unknown symbol, network error, ...).
    LookupFailure(String),
}

impl FetchOutcome {
    /// Error view of a non-`Found` outcome.
    pub fn error(&self, symbol: &str) -> Option<WatchError> {
        match self {
            FetchOutcome::Found(_) => None,
            FetchOutcome::NoData => Some(WatchError::NoData(symbol.to_string())),
            FetchOutcome::LookupFailure(reason) if reason.starts_with(symbol) => {
                Some(WatchError::Lookup(reason.clone()))
            }
            FetchOutcome::LookupFailure(reason) => {
                Some(WatchError::Lookup(format!("{}: {}", symbol, reason)))
            }
        }
    }
}

pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, symbol: &str) -> FetchOutcome {
        let queries = [
            (Period::OneDay, Granularity::IntraDay),
            (Period::FiveDays, Granularity::Daily),
        ];

        for (period, granularity) in queries {
            let points = match self.source.recent_prices(symbol, period, granularity).await {
                Ok(points) => points,
                Err(WatchError::Lookup(reason)) => return FetchOutcome::LookupFailure(reason),
                Err(e) => return FetchOutcome::LookupFailure(e.to_string()),
            };

            if let Some(latest) = latest_valid(&points) {
                debug!("{} latest {} close {:.2}", symbol, granularity, latest.close);
                return FetchOutcome::Found(PriceSample {
                    symbol: symbol.to_string(),
                    price: latest.close,
                    observed_at: latest.timestamp,
                    granularity,
                });
            }

            debug!("{} returned no {} prices", symbol, granularity);
        }

        FetchOutcome::NoData
    }
}

fn latest_valid(points: &[PricePoint]) -> Option<&PricePoint> {
    points
        .iter()
        .rev()
        .find(|p| p.close.is_finite() && p.close > 0.0)
}
