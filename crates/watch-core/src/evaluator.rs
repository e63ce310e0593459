//! Threshold classification.
//!
//! The upper bound is checked before the lower bound, so a misconfigured entry
//! (upper <= lower) whose price satisfies both always classifies as
//! `AboveUpper`. Bounds equal to zero are treated as unset.

use crate::types::{active_bound, Condition};

/// Classify `price` against the optional upper and lower thresholds.
pub fn evaluate(price: f64, upper_bound: Option<f64>, lower_bound: Option<f64>) -> Condition {
    if let Some(upper) = active_bound(upper_bound) {
        if price >= upper {
            return Condition::AboveUpper(upper);
        }
    }

    if let Some(lower) = active_bound(lower_bound) {
        if price <= lower {
            return Condition::BelowLower(lower);
        }
    }

    Condition::Normal
}
