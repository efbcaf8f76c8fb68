//! Display-derived arithmetic.
//!
//! Every function here is total: non-finite inputs are treated as missing and
//! collapse to the neutral default instead of propagating NaN into the view.

use serde::{Deserialize, Serialize};

pub const MARGIN_TIER_MEDIUM_FROM: f64 = 25.0;
pub const MARGIN_TIER_HIGH_FROM: f64 = 40.0;
pub const HIGH_CONFIDENCE_FROM: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Decrease,
    Unchanged,
    Increase,
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid rendering "-0.0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Signed `(new - old) / old * 100`, rounded to one decimal. Zero when `old` is zero.
pub fn percent_delta(old: f64, new: f64) -> f64 {
    if !old.is_finite() || !new.is_finite() || old == 0.0 {
        return 0.0;
    }
    round_to((new - old) / old * 100.0, 1)
}

/// `value / max_value * 100`, clamped to 0..=100. Zero when `max_value` is zero.
pub fn proportional_width(value: f64, max_value: f64) -> f64 {
    if !value.is_finite() || !max_value.is_finite() || max_value <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    (value / max_value * 100.0).clamp(0.0, 100.0)
}

/// Whole-number percentage share of each count. All zero when the counts sum to zero.
pub fn distribution_shares(counts: [u64; 3]) -> [f64; 3] {
    let total: u128 = counts.iter().map(|&c| c as u128).sum();
    if total == 0 {
        return [0.0; 3];
    }
    counts.map(|count| round_to(count as f64 / total as f64 * 100.0, 0))
}

pub fn margin_tier(margin: f64) -> MarginTier {
    if !margin.is_finite() || margin < MARGIN_TIER_MEDIUM_FROM {
        MarginTier::Low
    } else if margin < MARGIN_TIER_HIGH_FROM {
        MarginTier::Medium
    } else {
        MarginTier::High
    }
}

pub fn is_high_confidence(confidence: f64) -> bool {
    confidence.is_finite() && confidence >= HIGH_CONFIDENCE_FROM
}

pub fn confidence_percent(confidence: f64) -> f64 {
    round_to(confidence * 100.0, 0)
}

pub fn price_direction(current: f64, target: f64) -> PriceDirection {
    if !current.is_finite() || !target.is_finite() {
        return PriceDirection::Unchanged;
    }
    if target < current {
        PriceDirection::Decrease
    } else if target > current {
        PriceDirection::Increase
    } else {
        PriceDirection::Unchanged
    }
}
