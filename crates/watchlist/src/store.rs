//! In-memory watchlist for the current session.

use watch_core::{WatchEntry, WatchError};

/// Symbol → thresholds, kept in insertion order.
///
/// Re-inserting a symbol replaces its bounds wholesale; there is no removal.
#[derive(Debug, Clone, Default)]
pub struct WatchlistStore {
    entries: Vec<WatchEntry>,
}

impl WatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session seeded with the stock defaults (TSMC and Hon Hai).
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.entries.push(WatchEntry::new("2330.TW", Some(950.0), Some(850.0)));
        store.entries.push(WatchEntry::new("2317.TW", Some(180.0), Some(150.0)));
        store
    }

    /// Insert or overwrite the entry for `symbol`. Bound ordering is not checked.
    pub fn upsert(
        &mut self,
        symbol: &str,
        upper_bound: Option<f64>,
        lower_bound: Option<f64>,
    ) -> Result<&WatchEntry, WatchError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(WatchError::InvalidInput("symbol must not be empty".to_string()));
        }

        let entry = WatchEntry::new(symbol, upper_bound, lower_bound);
        let idx = match self.entries.iter().position(|e| e.symbol == symbol) {
            Some(idx) => {
                self.entries[idx] = entry;
                idx
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };

        tracing::debug!("Watchlist upsert {} (upper {:?}, lower {:?})", symbol, upper_bound, lower_bound);
        Ok(&self.entries[idx])
    }

    pub fn all(&self) -> &[WatchEntry] {
        &self.entries
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_overwrites_without_merge() {
        let mut store = WatchlistStore::new();
        store.upsert("AAA", Some(100.0), Some(50.0)).unwrap();
        store.upsert("AAA", Some(120.0), None).unwrap();

        assert_eq!(store.len(), 1);
        let entry = store.get("AAA").unwrap();
        assert_eq!(entry.upper_bound, Some(120.0));
        // lower bound is not carried over from the previous entry
        assert_eq!(entry.lower_bound, None);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut store = WatchlistStore::new();
        store.upsert("BBB", None, None).unwrap();
        store.upsert("AAA", None, None).unwrap();
        store.upsert("BBB", Some(1.0), None).unwrap();

        let symbols: Vec<_> = store.all().iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBB", "AAA"]);
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let mut store = WatchlistStore::new();
        assert!(matches!(
            store.upsert("   ", Some(1.0), None),
            Err(WatchError::InvalidInput(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_inverted_bounds_accepted() {
        let mut store = WatchlistStore::new();
        let entry = store.upsert(" AAA ", Some(50.0), Some(100.0)).unwrap();
        assert_eq!(entry.symbol, "AAA");
        assert_eq!(entry.upper_bound, Some(50.0));
    }

    #[test]
    fn test_defaults() {
        let store = WatchlistStore::with_defaults();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("2330.TW").unwrap().upper_bound, Some(950.0));
        assert_eq!(store.get("2317.TW").unwrap().lower_bound, Some(150.0));
    }
}
