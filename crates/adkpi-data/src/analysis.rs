//! Top-level analysis pipelines.
//!
//! Each pipeline is a pure function over classified records (and, where
//! total-revenue metrics are wanted, order lines): cohort comparison with
//! deltas, monthly trend, monthly TACoS, and the pre/post launch split.

use std::collections::BTreeMap;

use adkpi_core::fields::month_key;
use adkpi_core::metrics::{KpiSet, MetricDirection, RevenueKpis};
use adkpi_core::models::{AdRecord, Cohort, CohortTotals, OrderLine, TaggedRecord};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::CohortAggregator;
use crate::classifier::CohortClassifier;
use crate::reference::ReferenceSet;

// ── Classification pass ───────────────────────────────────────────────────────

/// Advertising records tagged with their cohorts, plus the exclusion count.
#[derive(Debug, Clone)]
pub struct ClassifiedData {
    pub tagged: Vec<TaggedRecord>,
    /// Records classified Unknown; excluded from cohort comparisons.
    pub unknown_count: usize,
}

/// Tag every record with its cohort.
pub fn classify_records(records: Vec<AdRecord>, refs: &ReferenceSet) -> ClassifiedData {
    let classifier = CohortClassifier::new();

    let mut counts: BTreeMap<Cohort, usize> = BTreeMap::new();
    let tagged: Vec<TaggedRecord> = records
        .into_iter()
        .map(|record| {
            let outcome = classifier.classify(&record.campaign, refs);
            *counts.entry(outcome.cohort).or_default() += 1;
            TaggedRecord {
                record,
                cohort: outcome.cohort,
                ids: outcome.ids,
            }
        })
        .collect();

    for (cohort, count) in &counts {
        debug!("Classified {} records as {}", count, cohort);
    }
    let unknown_count = counts.get(&Cohort::Unknown).copied().unwrap_or(0);
    if unknown_count > 0 {
        info!(
            "{} of {} records have no reference match and are excluded from cohort tables",
            unknown_count,
            tagged.len()
        );
    }

    ClassifiedData {
        tagged,
        unknown_count,
    }
}

// ── Cohort comparison ─────────────────────────────────────────────────────────

/// Totals and KPIs for one side of the comparison.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CohortSummary {
    pub totals: CohortTotals,
    pub kpis: KpiSet,
}

/// One row of the comparison table.
#[derive(Debug, Clone, Serialize)]
pub struct MetricDelta {
    pub name: &'static str,
    pub managed: f64,
    pub non_managed: f64,
    /// managed − non_managed, in the metric's own unit.
    pub delta: f64,
    /// Signed so that positive means "managed is better"; `None` for neutral
    /// metrics or a zero baseline.
    pub improvement_pct: Option<f64>,
    pub direction: MetricDirection,
    pub winner: Option<Cohort>,
}

/// The managed vs non-managed comparison.
#[derive(Debug, Clone, Serialize)]
pub struct CohortComparison {
    /// ISO-8601 timestamp when this comparison was generated.
    pub generated_at: String,
    /// Known-cohort records that entered the comparison.
    pub records_analyzed: u32,
    /// Unknown-cohort records excluded.
    pub unknown_excluded: usize,
    pub managed: CohortSummary,
    pub non_managed: CohortSummary,
    pub deltas: Vec<MetricDelta>,
}

/// Build the managed vs non-managed comparison with per-metric deltas,
/// improvements and winner judgments.
pub fn compare_cohorts(data: &ClassifiedData) -> CohortComparison {
    let groups = CohortAggregator::aggregate_by_cohort(&data.tagged);

    let summary_for = |cohort: Cohort| {
        groups
            .iter()
            .find(|g| g.cohort == cohort)
            .map(|g| CohortSummary {
                totals: g.totals.clone(),
                kpis: g.kpis.clone(),
            })
            .unwrap_or_default()
    };
    let managed = summary_for(Cohort::Managed);
    let non_managed = summary_for(Cohort::NonManaged);

    let deltas = build_deltas(&managed, &non_managed);
    let records_analyzed = managed.totals.records + non_managed.totals.records;

    CohortComparison {
        generated_at: Utc::now().to_rfc3339(),
        records_analyzed,
        unknown_excluded: data.unknown_count,
        managed,
        non_managed,
        deltas,
    }
}

/// The comparison-table rows, with one direction decision per metric applied
/// uniformly: cost-side ratios are lower-is-better, return-side ratios are
/// higher-is-better, raw totals are neutral.
fn build_deltas(managed: &CohortSummary, non_managed: &CohortSummary) -> Vec<MetricDelta> {
    use MetricDirection::{HigherIsBetter, LowerIsBetter, Neutral};

    let rows: [(&'static str, f64, f64, MetricDirection); 11] = [
        ("Spend", managed.totals.spend, non_managed.totals.spend, Neutral),
        ("Sales", managed.totals.sales, non_managed.totals.sales, Neutral),
        ("Orders", managed.totals.orders, non_managed.totals.orders, Neutral),
        ("ROAS", managed.kpis.roas, non_managed.kpis.roas, HigherIsBetter),
        ("ACOS", managed.kpis.acos, non_managed.kpis.acos, LowerIsBetter),
        ("CPC", managed.kpis.cpc, non_managed.kpis.cpc, LowerIsBetter),
        ("CTR", managed.kpis.ctr, non_managed.kpis.ctr, HigherIsBetter),
        ("CVR", managed.kpis.cvr, non_managed.kpis.cvr, HigherIsBetter),
        ("CPA", managed.kpis.cpa, non_managed.kpis.cpa, LowerIsBetter),
        ("CPM", managed.kpis.cpm, non_managed.kpis.cpm, LowerIsBetter),
        ("AOV", managed.kpis.aov, non_managed.kpis.aov, HigherIsBetter),
    ];

    rows.into_iter()
        .map(|(name, m, n, direction)| MetricDelta {
            name,
            managed: m,
            non_managed: n,
            delta: m - n,
            improvement_pct: direction.improvement_pct(m, n),
            direction,
            winner: direction.winner(m, n),
        })
        .collect()
}

// ── Revenue joins ─────────────────────────────────────────────────────────────

/// Sum order revenue per purchase date.
pub fn daily_revenue(orders: &[OrderLine]) -> BTreeMap<NaiveDate, f64> {
    let mut map: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for line in orders {
        *map.entry(line.purchase_date).or_default() += line.revenue();
    }
    map
}

/// One month of the TACoS table: ad totals joined with order revenue.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTacos {
    pub month: String,
    pub spend: f64,
    pub ad_sales: f64,
    pub total_revenue: f64,
    pub revenue: RevenueKpis,
}

/// Join monthly ad totals (both known cohorts combined) with monthly order
/// revenue. Months present on either side appear in the output.
pub fn monthly_tacos(data: &ClassifiedData, orders: &[OrderLine]) -> Vec<MonthlyTacos> {
    let mut ad_by_month: BTreeMap<String, CohortTotals> = BTreeMap::new();
    for group in CohortAggregator::aggregate_monthly(&data.tagged) {
        if let Some(month) = group.segment {
            ad_by_month.entry(month).or_default().merge(&group.totals);
        }
    }

    let mut revenue_by_month: BTreeMap<String, f64> = BTreeMap::new();
    for (date, revenue) in daily_revenue(orders) {
        *revenue_by_month.entry(month_key(date)).or_default() += revenue;
    }

    let months: std::collections::BTreeSet<String> = ad_by_month
        .keys()
        .chain(revenue_by_month.keys())
        .cloned()
        .collect();

    months
        .into_iter()
        .map(|month| {
            let totals = ad_by_month.remove(&month).unwrap_or_default();
            let total_revenue = revenue_by_month.get(&month).copied().unwrap_or(0.0);
            MonthlyTacos {
                revenue: RevenueKpis::from_totals(&totals, total_revenue),
                spend: totals.spend,
                ad_sales: totals.sales,
                total_revenue,
                month,
            }
        })
        .collect()
}

// ── Monthly trend ─────────────────────────────────────────────────────────────

/// One month × cohort row with month-over-month movement.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyTrendRow {
    pub month: String,
    pub cohort: Cohort,
    pub totals: CohortTotals,
    pub kpis: KpiSet,
    /// Spend change vs the same cohort's previous month, percent.
    pub spend_mom_pct: Option<f64>,
    /// Sales change vs the same cohort's previous month, percent.
    pub sales_mom_pct: Option<f64>,
}

/// Month-by-month KPI rows per cohort, with month-over-month deltas chained
/// within each cohort.
pub fn monthly_trend(data: &ClassifiedData) -> Vec<MonthlyTrendRow> {
    let groups = CohortAggregator::aggregate_monthly(&data.tagged);

    let mut previous: BTreeMap<Cohort, CohortTotals> = BTreeMap::new();
    let mut rows: Vec<MonthlyTrendRow> = Vec::with_capacity(groups.len());

    // Groups arrive sorted by (cohort, month), so walking them in order keeps
    // each cohort's month chain contiguous.
    for group in groups {
        let month = match group.segment {
            Some(m) => m,
            None => continue,
        };
        let prev = previous.get(&group.cohort);
        let pct_change = |current: f64, prior: Option<f64>| match prior {
            Some(p) if p != 0.0 => Some((current - p) / p * 100.0),
            _ => None,
        };
        rows.push(MonthlyTrendRow {
            spend_mom_pct: pct_change(group.totals.spend, prev.map(|p| p.spend)),
            sales_mom_pct: pct_change(group.totals.sales, prev.map(|p| p.sales)),
            month,
            cohort: group.cohort,
            kpis: group.kpis,
            totals: group.totals.clone(),
        });
        previous.insert(group.cohort, group.totals);
    }

    rows
}

// ── Pre/post launch split ─────────────────────────────────────────────────────

/// Aggregate metrics for one side of the launch split.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodMetrics {
    pub label: String,
    /// Distinct report dates inside the period.
    pub days: u32,
    pub totals: CohortTotals,
    pub kpis: KpiSet,
    /// Present when order data was supplied.
    pub total_revenue: Option<f64>,
    pub revenue: Option<RevenueKpis>,
    pub avg_daily_spend: f64,
    pub avg_daily_sales: f64,
}

/// The before/after comparison around the managed-advertising launch date.
#[derive(Debug, Clone, Serialize)]
pub struct PrePostAnalysis {
    pub launch_date: NaiveDate,
    pub pre: PeriodMetrics,
    pub post: PeriodMetrics,
}

/// Split records at `launch_date`: the pre period covers the
/// `pre_window_days` days immediately before launch, the post period runs
/// from launch onward. Unknown-cohort records are excluded on both sides.
pub fn pre_post_analysis(
    data: &ClassifiedData,
    orders: Option<&[OrderLine]>,
    launch_date: NaiveDate,
    pre_window_days: i64,
) -> PrePostAnalysis {
    let pre_start = launch_date - chrono::Duration::days(pre_window_days);

    let in_pre = |d: NaiveDate| d >= pre_start && d < launch_date;
    let in_post = |d: NaiveDate| d >= launch_date;

    let period = |label: &str, keep: &dyn Fn(NaiveDate) -> bool| {
        let mut totals = CohortTotals::default();
        let mut dates: std::collections::BTreeSet<NaiveDate> = Default::default();
        for tagged in &data.tagged {
            if !tagged.cohort.is_known() || !keep(tagged.record.date) {
                continue;
            }
            totals.add_record(&tagged.record);
            dates.insert(tagged.record.date);
        }

        let total_revenue = orders.map(|lines| {
            lines
                .iter()
                .filter(|l| keep(l.purchase_date))
                .map(OrderLine::revenue)
                .sum::<f64>()
        });
        let revenue = total_revenue.map(|rev| RevenueKpis::from_totals(&totals, rev));

        let days = dates.len() as u32;
        PeriodMetrics {
            label: label.to_string(),
            days,
            kpis: KpiSet::from_totals(&totals),
            avg_daily_spend: if days > 0 {
                totals.spend / days as f64
            } else {
                0.0
            },
            avg_daily_sales: if days > 0 {
                totals.sales / days as f64
            } else {
                0.0
            },
            total_revenue,
            revenue,
            totals,
        }
    };

    PrePostAnalysis {
        launch_date,
        pre: period("Pre-launch (manual only)", &in_pre),
        post: period("Post-launch (managed live)", &in_post),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
