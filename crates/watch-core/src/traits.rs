use async_trait::async_trait;
use crate::{Period, Granularity, PricePoint, StyleHint, WatchEntry, WatchError};

/// Market data provider that resolves a symbol to a time-ordered price series.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Returns prices ordered oldest first. An empty vector means the source
    /// had nothing for that window; an error means the lookup itself failed.
    async fn recent_prices(
        &self,
        symbol: &str,
        period: Period,
        granularity: Granularity,
    ) -> Result<Vec<PricePoint>, WatchError>;
}

/// Output half of the display/input surface.
pub trait DisplaySurface: Send + Sync {
    fn write_line(&self, text: &str, style: StyleHint);

    fn write_table(&self, entries: &[WatchEntry]);
}
