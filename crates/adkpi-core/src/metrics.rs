//! Derived KPI calculations.
//!
//! Every ratio is computed from summed numerator/denominator pairs and every
//! division is guarded: a zero denominator yields 0, never NaN or infinity.

use serde::{Deserialize, Serialize};

use crate::models::{Cohort, CohortTotals};

/// Divide `numerator` by `denominator`, substituting 0 when the denominator
/// is 0 (or non-finite garbage that slipped through coercion).
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

// ── KpiSet ────────────────────────────────────────────────────────────────────

/// The fixed vocabulary of advertising ratios derived from [`CohortTotals`].
///
/// Rate-style metrics (ACOS, CTR, CVR) are stored as fractions, not
/// percentages; presenters apply percent formatting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KpiSet {
    /// Return on ad spend: sales / spend.
    pub roas: f64,
    /// Advertising cost of sales: spend / sales.
    pub acos: f64,
    /// Cost per click: spend / clicks.
    pub cpc: f64,
    /// Click-through rate: clicks / impressions.
    pub ctr: f64,
    /// Conversion rate: orders / clicks.
    pub cvr: f64,
    /// Cost per acquisition: spend / orders.
    pub cpa: f64,
    /// Cost per thousand impressions: 1000 · spend / impressions.
    pub cpm: f64,
    /// Average order value: sales / orders.
    pub aov: f64,
}

impl KpiSet {
    /// Derive all ratios from summed totals.
    pub fn from_totals(totals: &CohortTotals) -> Self {
        Self {
            roas: safe_ratio(totals.sales, totals.spend),
            acos: safe_ratio(totals.spend, totals.sales),
            cpc: safe_ratio(totals.spend, totals.clicks),
            ctr: safe_ratio(totals.clicks, totals.impressions),
            cvr: safe_ratio(totals.orders, totals.clicks),
            cpa: safe_ratio(totals.spend, totals.orders),
            cpm: safe_ratio(1000.0 * totals.spend, totals.impressions),
            aov: safe_ratio(totals.sales, totals.orders),
        }
    }
}

// ── RevenueKpis ───────────────────────────────────────────────────────────────

/// Whole-business metrics that need a separately sourced total-revenue figure
/// (attributed ad sales plus organic sales).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueKpis {
    /// Total advertising cost of sales: spend / total revenue.
    pub tacos: f64,
    /// Total return on ad spend: total revenue / spend.
    pub t_roas: f64,
    /// Total revenue minus attributed ad sales. Clamped at 0 when attributed
    /// sales exceed the sourced revenue figure (partial order data).
    pub organic_sales: f64,
    /// Organic share of total revenue.
    pub organic_ratio: f64,
}

impl RevenueKpis {
    /// Derive the total-revenue metrics from ad totals and an external
    /// revenue sum.
    pub fn from_totals(totals: &CohortTotals, total_revenue: f64) -> Self {
        let organic_sales = (total_revenue - totals.sales).max(0.0);
        Self {
            tacos: safe_ratio(totals.spend, total_revenue),
            t_roas: safe_ratio(total_revenue, totals.spend),
            organic_sales,
            organic_ratio: safe_ratio(organic_sales, total_revenue),
        }
    }
}

// ── MetricDirection ───────────────────────────────────────────────────────────

/// Which way a metric should move to count as "better".
///
/// Raw totals like spend carry no judgment since more spend is neither good
/// nor bad on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricDirection {
    HigherIsBetter,
    LowerIsBetter,
    Neutral,
}

impl MetricDirection {
    /// Judge the winning cohort for one metric value pair.
    ///
    /// Returns `None` for neutral metrics and exact ties.
    pub fn winner(&self, managed: f64, non_managed: f64) -> Option<Cohort> {
        if managed == non_managed {
            return None;
        }
        match self {
            MetricDirection::Neutral => None,
            MetricDirection::HigherIsBetter => Some(if managed > non_managed {
                Cohort::Managed
            } else {
                Cohort::NonManaged
            }),
            MetricDirection::LowerIsBetter => Some(if managed < non_managed {
                Cohort::Managed
            } else {
                Cohort::NonManaged
            }),
        }
    }

    /// Percentage improvement of `managed` over `non_managed`, signed so that
    /// positive always means "managed is better". `None` when the baseline is
    /// zero or the metric is neutral.
    pub fn improvement_pct(&self, managed: f64, non_managed: f64) -> Option<f64> {
        if non_managed == 0.0 {
            return None;
        }
        match self {
            MetricDirection::Neutral => None,
            MetricDirection::HigherIsBetter => {
                Some((managed - non_managed) / non_managed * 100.0)
            }
            MetricDirection::LowerIsBetter => {
                Some((non_managed - managed) / non_managed * 100.0)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
