use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A watched ticker and its alert thresholds.
///
/// A bound of `None` or `0.0` means "no threshold on that side".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub symbol: String,
    pub upper_bound: Option<f64>,
    pub lower_bound: Option<f64>,
}

impl WatchEntry {
    pub fn new(symbol: impl Into<String>, upper_bound: Option<f64>, lower_bound: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            upper_bound,
            lower_bound,
        }
    }

    /// Upper bound if it is an active threshold (set and nonzero).
    pub fn active_upper(&self) -> Option<f64> {
        active_bound(self.upper_bound)
    }

    /// Lower bound if it is an active threshold (set and nonzero).
    pub fn active_lower(&self) -> Option<f64> {
        active_bound(self.lower_bound)
    }
}

pub(crate) fn active_bound(bound: Option<f64>) -> Option<f64> {
    bound.filter(|b| *b != 0.0)
}

/// Sampling resolution of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// Minute bars from the most recent session
    IntraDay,
    /// Daily closes
    Daily,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::IntraDay => "intraday",
            Granularity::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look-back window requested from a price source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneDay,
    FiveDays,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
        }
    }
}

/// One `(timestamp, close)` observation returned by a price source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Latest price for a symbol, produced once per check and discarded after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub symbol: String,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
    pub granularity: Granularity,
}

/// Result of comparing a price against an entry's thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Normal,
    AboveUpper(f64),
    BelowLower(f64),
}

impl Condition {
    pub fn is_crossing(&self) -> bool {
        !matches!(self, Condition::Normal)
    }

    pub fn style(&self) -> StyleHint {
        match self {
            Condition::Normal => StyleHint::Plain,
            Condition::AboveUpper(_) => StyleHint::AboveUpper,
            Condition::BelowLower(_) => StyleHint::BelowLower,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Normal => f.write_str("normal"),
            Condition::AboveUpper(bound) => write!(f, "above upper {}", bound),
            Condition::BelowLower(bound) => write!(f, "below lower {}", bound),
        }
    }
}

/// A threshold crossing to be delivered to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub symbol: String,
    pub price: f64,
    pub condition: Condition,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Builds an event for a crossing; `None` when the condition is `Normal`.
    pub fn from_sample(sample: &PriceSample, condition: Condition) -> Option<Self> {
        if !condition.is_crossing() {
            return None;
        }
        Some(Self {
            symbol: sample.symbol.clone(),
            price: sample.price,
            condition,
            timestamp: Utc::now(),
        })
    }
}

/// Severity of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Presentation hint attached to each line written to the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleHint {
    Plain,
    AboveUpper,
    BelowLower,
    Success,
    Warning,
    Error,
}

impl From<Severity> for StyleHint {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => StyleHint::Plain,
            Severity::Warning => StyleHint::Warning,
            Severity::Error => StyleHint::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bound_is_inactive() {
        let entry = WatchEntry::new("AAA", Some(0.0), Some(50.0));
        assert_eq!(entry.active_upper(), None);
        assert_eq!(entry.active_lower(), Some(50.0));
    }

    #[test]
    fn test_condition_display_includes_bound() {
        assert_eq!(Condition::AboveUpper(100.0).to_string(), "above upper 100");
        assert_eq!(Condition::BelowLower(50.5).to_string(), "below lower 50.5");
        assert_eq!(Condition::Normal.to_string(), "normal");
    }

    #[test]
    fn test_styles_are_distinct() {
        assert_ne!(Condition::AboveUpper(1.0).style(), Condition::Normal.style());
        assert_ne!(Condition::BelowLower(1.0).style(), Condition::Normal.style());
        assert_ne!(
            Condition::AboveUpper(1.0).style(),
            Condition::BelowLower(1.0).style()
        );
    }

    #[test]
    fn test_event_only_for_crossing() {
        let sample = PriceSample {
            symbol: "AAA".to_string(),
            price: 75.0,
            observed_at: Utc::now(),
            granularity: Granularity::Daily,
        };
        assert!(NotificationEvent::from_sample(&sample, Condition::Normal).is_none());

        let event = NotificationEvent::from_sample(&sample, Condition::BelowLower(80.0)).unwrap();
        assert_eq!(event.symbol, "AAA");
        assert_eq!(event.price, 75.0);
    }
}
