use serde::{Deserialize, Serialize};

/// Aggregate analytics returned by `GET {base}/analytics`.
///
/// Every sub-object and every numeric field may be absent; the accessors below
/// substitute zero so callers never have to branch on presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    #[serde(default)]
    pub revenue_impact: Option<RevenueImpact>,
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub margin_distribution: Option<MarginDistribution>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueImpact {
    #[serde(default)]
    pub actual_revenue: Option<f64>,
    #[serde(default)]
    pub counterfactual_revenue: Option<f64>,
    #[serde(default)]
    pub revenue_lift: Option<f64>,
    #[serde(default)]
    pub revenue_lift_percentage: Option<f64>,
    #[serde(default)]
    pub price_changes_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub total_products: Option<u64>,
    #[serde(default)]
    pub pending_approvals: Option<u64>,
    #[serde(default)]
    pub auto_approved_today: Option<u64>,
    #[serde(default)]
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginDistribution {
    #[serde(default)]
    pub average_margin: Option<f64>,
    #[serde(default)]
    pub min_margin: Option<f64>,
    #[serde(default)]
    pub max_margin: Option<f64>,
    #[serde(default)]
    pub products_below_30: Option<u64>,
    #[serde(default)]
    pub products_30_to_50: Option<u64>,
    #[serde(default)]
    pub products_above_50: Option<u64>,
}

macro_rules! zero_default_accessors {
    ($group:ident: $($field:ident -> $ty:ty),+ $(,)?) => {
        $(
            pub fn $field(&self) -> $ty {
                self.$group
                    .as_ref()
                    .and_then(|g| g.$field)
                    .unwrap_or_default()
            }
        )+
    };
}

impl AnalyticsSnapshot {
    zero_default_accessors!(revenue_impact:
        actual_revenue -> f64,
        counterfactual_revenue -> f64,
        revenue_lift -> f64,
        revenue_lift_percentage -> f64,
        price_changes_count -> u64,
    );

    zero_default_accessors!(summary:
        total_products -> u64,
        pending_approvals -> u64,
        auto_approved_today -> u64,
        avg_confidence -> f64,
    );

    zero_default_accessors!(margin_distribution:
        average_margin -> f64,
        min_margin -> f64,
        max_margin -> f64,
        products_below_30 -> u64,
        products_30_to_50 -> u64,
        products_above_50 -> u64,
    );
}
