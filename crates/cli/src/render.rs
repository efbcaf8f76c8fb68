use priceopt_core::metrics::{MarginTier, PriceDirection};
use priceopt_core::view::{DashboardView, MarginDistributionView, PriceBar, RevenueChart};
use std::fmt::Write;

const BAR_CELLS: f64 = 40.0;

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    out.push_str("PriceOptimize AI - Dynamic Pricing Intelligence Dashboard\n\n");

    render_cards(&mut out, view);
    render_products(&mut out, view);
    if !view.pending_changes.is_empty() {
        render_pending(&mut out, view);
    }
    render_revenue(&mut out, &view.revenue_chart);
    render_price_chart(&mut out, &view.price_chart);
    render_margins(&mut out, &view.margin_distribution);
    out
}

fn render_cards(out: &mut String, view: &DashboardView) {
    let c = &view.cards;
    let _ = writeln!(
        out,
        "Revenue Lift      ${:.0}  (+{:.1}%)",
        c.revenue_lift, c.revenue_lift_pct
    );
    let _ = writeln!(
        out,
        "Total Products    {}  ({} active)",
        c.total_products, c.active_products
    );
    let _ = writeln!(
        out,
        "Pending Approvals {}  ({})",
        c.pending_approvals,
        c.attention_label()
    );
    let _ = writeln!(out, "Avg Confidence    {:.0}%\n", c.avg_confidence_pct);
}

fn render_products(out: &mut String, view: &DashboardView) {
    out.push_str("Product Catalog\n");
    let _ = writeln!(
        out,
        "{:<32} {:<10} {:<14} {:>10} {:>12} {:>7} {:>8} {:>6} {:>9}",
        "Product", "SKU", "Category", "Current", "Recommended", "Change", "Margin", "Conf", "Inventory"
    );
    for row in &view.products {
        let _ = writeln!(
            out,
            "{:<32} {:<10} {:<14} {:>10} {:>11}{} {:>+6.1}% {:>6.0}%{} {:>5.0}%{} {:>9}",
            truncate(&row.name, 32),
            truncate(&row.sku, 10),
            truncate(&row.category, 14),
            format!("${:.2}", row.current_price),
            format!("${:.2}", row.recommended_price),
            direction_marker(row.direction),
            row.delta_pct,
            row.margin,
            tier_marker(row.margin_tier),
            row.confidence_pct,
            if row.high_confidence { "*" } else { " " },
            row.inventory_level,
        );
    }
    out.push('\n');
}

fn render_pending(out: &mut String, view: &DashboardView) {
    out.push_str("Pending Price Changes\n");
    let _ = writeln!(
        out,
        "{:<32} {:>10} {:>10} {:>7} {:>6} {:>10}  Reason",
        "Product", "Current", "New", "Change", "Conf", "New Margin"
    );
    for row in &view.pending_changes {
        let _ = writeln!(
            out,
            "{:<32} {:>10} {:>10} {:>+6.1}% {:>5.0}%{} {:>8.1}%{}  {}",
            truncate(&row.product_name, 32),
            format!("${:.2}", row.old_price),
            format!("${:.2}", row.new_price),
            row.delta_pct,
            row.confidence_pct,
            if row.high_confidence { "*" } else { " " },
            row.margin_after_change,
            tier_marker(row.margin_tier),
            row.reason,
        );
    }
    out.push('\n');
}

fn render_revenue(out: &mut String, chart: &RevenueChart) {
    out.push_str("Revenue Impact\n");
    let _ = writeln!(
        out,
        "  Actual      {} ${:.0}",
        bar(chart.actual_width),
        chart.actual_revenue
    );
    let _ = writeln!(
        out,
        "  Without AI  {} ${:.0}",
        bar(chart.counterfactual_width),
        chart.counterfactual_revenue
    );
    let _ = writeln!(
        out,
        "  Lift: ${:.0} ({:.2}%)\n",
        chart.revenue_lift, chart.revenue_lift_pct
    );
}

fn render_price_chart(out: &mut String, bars: &[PriceBar]) {
    if bars.is_empty() {
        return;
    }
    out.push_str("Current vs Recommended\n");
    for b in bars {
        let _ = writeln!(out, "  {:<12} cur {}", truncate(&b.label, 12), bar(b.current_width));
        let _ = writeln!(out, "  {:<12} rec {}", "", bar(b.recommended_width));
    }
    out.push('\n');
}

fn render_margins(out: &mut String, md: &MarginDistributionView) {
    out.push_str("Margin Distribution\n");
    let _ = writeln!(
        out,
        "  Average {:.1}%  Range {:.1}% - {:.1}%",
        md.average_margin, md.min_margin, md.max_margin
    );
    for (label, count, share) in [
        ("<30%", md.products_below_30, md.share_below_30),
        ("30-50%", md.products_30_to_50, md.share_30_to_50),
        (">50%", md.products_above_50, md.share_above_50),
    ] {
        let _ = writeln!(out, "  {label:<7} {} {count} ({share:.0}%)", bar(share));
    }
}

fn bar(width_pct: f64) -> String {
    let filled = (width_pct / 100.0 * BAR_CELLS).round().clamp(0.0, BAR_CELLS) as usize;
    let mut s = "#".repeat(filled);
    s.push_str(&".".repeat(BAR_CELLS as usize - filled));
    s
}

fn direction_marker(direction: PriceDirection) -> char {
    match direction {
        PriceDirection::Decrease => 'v',
        PriceDirection::Increase => '^',
        PriceDirection::Unchanged => ' ',
    }
}

fn tier_marker(tier: MarginTier) -> char {
    match tier {
        MarginTier::Low => '!',
        MarginTier::Medium => ' ',
        MarginTier::High => '+',
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    t.push('~');
    t
}
