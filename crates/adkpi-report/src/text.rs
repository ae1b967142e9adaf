//! Fixed-width console rendering of the analysis results.

use std::fmt::Write;

use adkpi_core::formatting::{format_currency, format_multiple, format_number, format_percent};
use adkpi_data::aggregator::AggregatedGroup;
use adkpi_data::analysis::{
    CohortComparison, MonthlyTacos, MonthlyTrendRow, PeriodMetrics, PrePostAnalysis,
};

use crate::workbook::ReportBundle;

const BANNER_WIDTH: usize = 78;

fn banner(out: &mut String, title: &str) {
    let rule = "=".repeat(BANNER_WIDTH);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "  {title}");
    let _ = writeln!(out, "{rule}");
}

/// Format a comparison metric for display, by metric name.
fn metric_value(name: &str, value: f64) -> String {
    match name {
        "Spend" | "Sales" | "CPC" | "CPA" | "CPM" | "AOV" => format_currency(value),
        "ACOS" | "CTR" | "CVR" => format_percent(value),
        "ROAS" => format_multiple(value),
        "Orders" => format_number(value, 0),
        _ => format_number(value, 2),
    }
}

/// Render the full report as one text block.
pub fn render_report(bundle: &ReportBundle<'_>) -> String {
    let mut out = String::new();
    render_comparison(&mut out, bundle.comparison);
    render_monthly_trend(&mut out, bundle.monthly);
    if let Some(asin) = bundle.asin {
        render_asin_breakdown(&mut out, asin);
    }
    if let Some(tacos) = bundle.tacos {
        render_tacos(&mut out, tacos);
    }
    if let Some(pre_post) = bundle.pre_post {
        render_pre_post(&mut out, pre_post);
    }
    out
}

pub fn render_comparison(out: &mut String, comparison: &CohortComparison) {
    banner(out, "MANAGED VS NON-MANAGED PERFORMANCE");
    let _ = writeln!(
        out,
        "  {} records analyzed ({} unmatched excluded)",
        comparison.records_analyzed, comparison.unknown_excluded
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {:<8} {:>14} {:>14} {:>12} {:>12}",
        "Metric", "Managed", "Non-Managed", "Improvement", "Winner"
    );
    let _ = writeln!(out, "  {}", "-".repeat(64));

    for delta in &comparison.deltas {
        let improvement = delta
            .improvement_pct
            .map(|pct| format!("{pct:+.1}%"))
            .unwrap_or_else(|| "-".to_string());
        let winner = delta.winner.map(|c| c.label()).unwrap_or("-");
        let _ = writeln!(
            out,
            "  {:<8} {:>14} {:>14} {:>12} {:>12}",
            delta.name,
            metric_value(delta.name, delta.managed),
            metric_value(delta.name, delta.non_managed),
            improvement,
            winner
        );
    }
    let _ = writeln!(out);
}

pub fn render_monthly_trend(out: &mut String, rows: &[MonthlyTrendRow]) {
    banner(out, "MONTHLY TREND BY COHORT");
    let _ = writeln!(
        out,
        "  {:<8} {:<12} {:>12} {:>12} {:>8} {:>8} {:>10} {:>10}",
        "Month", "Cohort", "Spend", "Sales", "ROAS", "ACOS", "Spend MoM", "Sales MoM"
    );
    let _ = writeln!(out, "  {}", "-".repeat(88));

    for row in rows {
        let mom = |pct: Option<f64>| {
            pct.map(|p| format!("{p:+.1}%"))
                .unwrap_or_else(|| "-".to_string())
        };
        let _ = writeln!(
            out,
            "  {:<8} {:<12} {:>12} {:>12} {:>8} {:>8} {:>10} {:>10}",
            row.month,
            row.cohort.label(),
            format_currency(row.totals.spend),
            format_currency(row.totals.sales),
            format_multiple(row.kpis.roas),
            format_percent(row.kpis.acos),
            mom(row.spend_mom_pct),
            mom(row.sales_mom_pct)
        );
    }
    let _ = writeln!(out);
}

pub fn render_asin_breakdown(out: &mut String, groups: &[AggregatedGroup]) {
    banner(out, "PER-ASIN BREAKDOWN");
    let _ = writeln!(
        out,
        "  {:<12} {:<12} {:>8} {:>12} {:>12} {:>8} {:>8}",
        "ASIN", "Cohort", "Records", "Spend", "Sales", "ROAS", "ACOS"
    );
    let _ = writeln!(out, "  {}", "-".repeat(78));

    for group in groups {
        let asin = group.segment.as_deref().unwrap_or("(no ASIN)");
        let _ = writeln!(
            out,
            "  {:<12} {:<12} {:>8} {:>12} {:>12} {:>8} {:>8}",
            asin,
            group.cohort.label(),
            group.totals.records,
            format_currency(group.totals.spend),
            format_currency(group.totals.sales),
            format_multiple(group.kpis.roas),
            format_percent(group.kpis.acos)
        );
    }
    let _ = writeln!(out);
}

pub fn render_tacos(out: &mut String, rows: &[MonthlyTacos]) {
    banner(out, "TOTAL ADVERTISING COST OF SALES (TACOS)");
    let _ = writeln!(
        out,
        "  {:<8} {:>12} {:>12} {:>14} {:>14} {:>8} {:>8} {:>10}",
        "Month", "Ad Spend", "Ad Sales", "Revenue", "Organic", "TACoS", "T-ROAS", "Organic %"
    );
    let _ = writeln!(out, "  {}", "-".repeat(92));

    for row in rows {
        let _ = writeln!(
            out,
            "  {:<8} {:>12} {:>12} {:>14} {:>14} {:>8} {:>8} {:>10}",
            row.month,
            format_currency(row.spend),
            format_currency(row.ad_sales),
            format_currency(row.total_revenue),
            format_currency(row.revenue.organic_sales),
            format_percent(row.revenue.tacos),
            format_multiple(row.revenue.t_roas),
            format_percent(row.revenue.organic_ratio)
        );
    }
    let _ = writeln!(out);
}

pub fn render_pre_post(out: &mut String, analysis: &PrePostAnalysis) {
    banner(out, "PRE VS POST LAUNCH");
    let _ = writeln!(out, "  Launch date: {}", analysis.launch_date);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {:<18} {:>16} {:>16}",
        "Metric", &analysis.pre.label, &analysis.post.label
    );
    let _ = writeln!(out, "  {}", "-".repeat(62));

    let line = |out: &mut String, label: &str, pre: String, post: String| {
        let _ = writeln!(out, "  {label:<18} {pre:>16} {post:>16}");
    };
    let pre = &analysis.pre;
    let post = &analysis.post;
    line(out, "Days", pre.days.to_string(), post.days.to_string());
    line(
        out,
        "Spend",
        format_currency(pre.totals.spend),
        format_currency(post.totals.spend),
    );
    line(
        out,
        "Sales",
        format_currency(pre.totals.sales),
        format_currency(post.totals.sales),
    );
    line(
        out,
        "ROAS",
        format_multiple(pre.kpis.roas),
        format_multiple(post.kpis.roas),
    );
    line(
        out,
        "ACOS",
        format_percent(pre.kpis.acos),
        format_percent(post.kpis.acos),
    );
    line(
        out,
        "Avg daily spend",
        format_currency(pre.avg_daily_spend),
        format_currency(post.avg_daily_spend),
    );
    line(
        out,
        "Avg daily sales",
        format_currency(pre.avg_daily_sales),
        format_currency(post.avg_daily_sales),
    );
    render_period_revenue(out, pre, post, &line);
    let _ = writeln!(out);
}

fn render_period_revenue(
    out: &mut String,
    pre: &PeriodMetrics,
    post: &PeriodMetrics,
    line: &dyn Fn(&mut String, &str, String, String),
) {
    if let (Some(pre_rev), Some(post_rev)) = (pre.total_revenue, post.total_revenue) {
        line(
            out,
            "Total revenue",
            format_currency(pre_rev),
            format_currency(post_rev),
        );
    }
    if let (Some(pre_k), Some(post_k)) = (&pre.revenue, &post.revenue) {
        line(
            out,
            "TACoS",
            format_percent(pre_k.tacos),
            format_percent(post_k.tacos),
        );
        line(
            out,
            "Organic sales",
            format_currency(pre_k.organic_sales),
            format_currency(post_k.organic_sales),
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adkpi_core::models::{AdRecord, OrderLine};
    use adkpi_data::analysis::{
        classify_records, compare_cohorts, monthly_tacos, monthly_trend, pre_post_analysis,
    };
    use adkpi_data::reference::ReferenceSet;
    use chrono::NaiveDate;
    use std::collections::{HashMap, HashSet};

    fn refs() -> ReferenceSet {
        let managed_asins: HashSet<String> =
            ["B0MANAGED1"].iter().map(|s| s.to_string()).collect();
        let universe_asins: HashSet<String> = ["B0MANAGED1", "B0MANUAL01"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let non_managed_asins = universe_asins
            .difference(&managed_asins)
            .cloned()
            .collect();
        ReferenceSet {
            managed_asins,
            managed_skus: HashSet::new(),
            universe_asins,
            non_managed_asins,
            sku_to_asin: HashMap::new(),
            asin_to_sku: HashMap::new(),
        }
    }

    fn record(campaign: &str, date: &str, spend: f64, sales: f64) -> AdRecord {
        AdRecord {
            campaign: campaign.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            spend,
            sales,
            orders: 2.0,
            clicks: 10.0,
            impressions: 1000.0,
            units: 2.0,
        }
    }

    #[test]
    fn test_comparison_text_contains_metrics_and_winner() {
        let data = classify_records(
            vec![
                record("SP | B0MANAGED1 | exact", "2025-12-01", 100.0, 250.0),
                record("SP | B0MANUAL01 | broad", "2025-12-01", 50.0, 50.0),
            ],
            &refs(),
        );
        let comparison = compare_cohorts(&data);

        let mut out = String::new();
        render_comparison(&mut out, &comparison);

        assert!(out.contains("MANAGED VS NON-MANAGED PERFORMANCE"));
        assert!(out.contains("ROAS"));
        assert!(out.contains("2.50x"));
        assert!(out.contains("$100.00"));
        assert!(out.contains("Managed"));
    }

    #[test]
    fn test_full_report_includes_optional_sections() {
        let data = classify_records(
            vec![record("SP | B0MANAGED1 | exact", "2025-12-01", 100.0, 250.0)],
            &refs(),
        );
        let comparison = compare_cohorts(&data);
        let monthly = monthly_trend(&data);
        let orders = vec![OrderLine {
            order_id: "o-1".to_string(),
            sku: "NT100A".to_string(),
            asin: "B0MANAGED1".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            item_price: 500.0,
            quantity: 1.0,
        }];
        let tacos = monthly_tacos(&data, &orders);
        let launch = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let pre_post = pre_post_analysis(&data, Some(&orders), launch, 30);

        let by_asin = adkpi_data::aggregator::CohortAggregator::aggregate_by_asin(&data.tagged);
        let bundle = ReportBundle {
            comparison: &comparison,
            monthly: &monthly,
            asin: Some(&by_asin),
            tacos: Some(&tacos),
            pre_post: Some(&pre_post),
        };
        let out = render_report(&bundle);

        assert!(out.contains("MONTHLY TREND BY COHORT"));
        assert!(out.contains("PER-ASIN BREAKDOWN"));
        assert!(out.contains("B0MANAGED1"));
        assert!(out.contains("TOTAL ADVERTISING COST OF SALES"));
        assert!(out.contains("PRE VS POST LAUNCH"));
        assert!(out.contains("Launch date: 2025-11-15"));
        // Sections come out in a fixed order: comparison first, pre/post last.
        let first = out.find("MANAGED VS NON-MANAGED PERFORMANCE").unwrap();
        let last = out.find("PRE VS POST LAUNCH").unwrap();
        assert!(first < out.find("MONTHLY TREND BY COHORT").unwrap());
        assert!(out.find("PER-ASIN BREAKDOWN").unwrap() < last);
    }

    #[test]
    fn test_monthly_trend_text_dashes_without_mom() {
        let data = classify_records(
            vec![record("SP | B0MANAGED1 | exact", "2025-12-01", 100.0, 250.0)],
            &refs(),
        );
        let rows = monthly_trend(&data);
        let mut out = String::new();
        render_monthly_trend(&mut out, &rows);
        // First month has no prior month to compare against.
        assert!(out.contains("2025-12"));
        let data_line = out.lines().find(|l| l.contains("2025-12")).unwrap();
        assert!(data_line.trim_end().ends_with('-'));
    }
}
