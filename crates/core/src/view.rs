use crate::domain::analytics::AnalyticsSnapshot;
use crate::domain::catalog::{PendingChange, Product};
use crate::domain::snapshot::DashboardSnapshot;
use crate::metrics::{self, MarginTier, PriceDirection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub cards: MetricCards,
    pub products: Vec<ProductRow>,
    pub pending_changes: Vec<PendingChangeRow>,
    pub revenue_chart: RevenueChart,
    pub price_chart: Vec<PriceBar>,
    pub margin_distribution: MarginDistributionView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCards {
    pub revenue_lift: f64,
    pub revenue_lift_pct: f64,
    pub total_products: u64,
    pub active_products: usize,
    pub pending_approvals: u64,
    pub needs_attention: bool,
    pub avg_confidence_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub current_price: f64,
    pub recommended_price: f64,
    pub delta_pct: f64,
    pub direction: PriceDirection,
    pub margin: f64,
    pub margin_tier: MarginTier,
    pub confidence_pct: f64,
    pub high_confidence: bool,
    pub inventory_level: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingChangeRow {
    pub id: i64,
    pub product_name: String,
    pub sku: String,
    pub old_price: f64,
    pub new_price: f64,
    pub delta_pct: f64,
    pub is_increase: bool,
    pub reason: String,
    pub confidence_pct: f64,
    pub high_confidence: bool,
    pub margin_after_change: f64,
    pub margin_tier: MarginTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueChart {
    pub actual_revenue: f64,
    pub counterfactual_revenue: f64,
    pub actual_width: f64,
    pub counterfactual_width: f64,
    pub revenue_lift: f64,
    pub revenue_lift_pct: f64,
}

/// Current vs recommended price for one product, scaled against the largest price shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub product_id: i64,
    pub label: String,
    pub current_width: f64,
    pub recommended_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginDistributionView {
    pub average_margin: f64,
    pub min_margin: f64,
    pub max_margin: f64,
    pub products_below_30: u64,
    pub products_30_to_50: u64,
    pub products_above_50: u64,
    pub share_below_30: f64,
    pub share_30_to_50: f64,
    pub share_above_50: f64,
}

impl DashboardView {
    pub fn from_snapshot(snapshot: &DashboardSnapshot) -> Self {
        let analytics = &snapshot.analytics;
        Self {
            cards: MetricCards::new(analytics, &snapshot.products, &snapshot.pending_changes),
            products: snapshot.products.iter().map(ProductRow::from).collect(),
            pending_changes: snapshot
                .pending_changes
                .iter()
                .map(PendingChangeRow::from)
                .collect(),
            revenue_chart: RevenueChart::from(analytics),
            price_chart: price_bars(&snapshot.products),
            margin_distribution: MarginDistributionView::from(analytics),
        }
    }
}

impl MetricCards {
    fn new(analytics: &AnalyticsSnapshot, products: &[Product], pending: &[PendingChange]) -> Self {
        Self {
            revenue_lift: analytics.revenue_lift(),
            revenue_lift_pct: metrics::round_to(analytics.revenue_lift_percentage(), 1),
            total_products: analytics.total_products(),
            active_products: products.len(),
            pending_approvals: analytics.pending_approvals(),
            needs_attention: !pending.is_empty(),
            avg_confidence_pct: metrics::confidence_percent(analytics.avg_confidence()),
        }
    }

    pub fn attention_label(&self) -> &'static str {
        if self.needs_attention {
            "Needs attention"
        } else {
            "All clear"
        }
    }
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            sku: p.sku.clone(),
            category: p.category.clone(),
            current_price: p.current_price,
            recommended_price: p.recommended_price,
            delta_pct: metrics::percent_delta(p.current_price, p.recommended_price),
            direction: metrics::price_direction(p.current_price, p.recommended_price),
            margin: p.margin,
            margin_tier: metrics::margin_tier(p.margin),
            confidence_pct: metrics::confidence_percent(p.confidence),
            high_confidence: metrics::is_high_confidence(p.confidence),
            inventory_level: p.inventory_level,
        }
    }
}

impl From<&PendingChange> for PendingChangeRow {
    fn from(c: &PendingChange) -> Self {
        Self {
            id: c.id,
            product_name: c.product_name.clone(),
            sku: c.sku.clone(),
            old_price: c.old_price,
            new_price: c.new_price,
            delta_pct: metrics::percent_delta(c.old_price, c.new_price),
            is_increase: metrics::price_direction(c.old_price, c.new_price)
                == PriceDirection::Increase,
            reason: c.reason.clone(),
            confidence_pct: metrics::confidence_percent(c.confidence),
            high_confidence: metrics::is_high_confidence(c.confidence),
            margin_after_change: c.margin_after_change,
            margin_tier: metrics::margin_tier(c.margin_after_change),
        }
    }
}

impl From<&AnalyticsSnapshot> for RevenueChart {
    fn from(a: &AnalyticsSnapshot) -> Self {
        let actual = a.actual_revenue();
        let counterfactual = a.counterfactual_revenue();
        let max = actual.max(counterfactual);
        Self {
            actual_revenue: actual,
            counterfactual_revenue: counterfactual,
            actual_width: metrics::proportional_width(actual, max),
            counterfactual_width: metrics::proportional_width(counterfactual, max),
            revenue_lift: a.revenue_lift(),
            revenue_lift_pct: metrics::round_to(a.revenue_lift_percentage(), 2),
        }
    }
}

impl From<&AnalyticsSnapshot> for MarginDistributionView {
    fn from(a: &AnalyticsSnapshot) -> Self {
        let counts = [
            a.products_below_30(),
            a.products_30_to_50(),
            a.products_above_50(),
        ];
        let [share_below_30, share_30_to_50, share_above_50] = metrics::distribution_shares(counts);
        Self {
            average_margin: metrics::round_to(a.average_margin(), 1),
            min_margin: metrics::round_to(a.min_margin(), 1),
            max_margin: metrics::round_to(a.max_margin(), 1),
            products_below_30: counts[0],
            products_30_to_50: counts[1],
            products_above_50: counts[2],
            share_below_30,
            share_30_to_50,
            share_above_50,
        }
    }
}

fn price_bars(products: &[Product]) -> Vec<PriceBar> {
    let max_price = products
        .iter()
        .flat_map(|p| [p.current_price, p.recommended_price])
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    products
        .iter()
        .map(|p| PriceBar {
            product_id: p.id,
            label: if p.sku.is_empty() {
                p.name.clone()
            } else {
                p.sku.clone()
            },
            current_width: metrics::proportional_width(p.current_price, max_price),
            recommended_width: metrics::proportional_width(p.recommended_price, max_price),
        })
        .collect()
}
