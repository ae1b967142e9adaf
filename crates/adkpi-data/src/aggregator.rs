//! Cohort aggregation over whole-run, daily, monthly and per-ASIN groupings.
//!
//! Groups tagged records, sums the numerator fields, and derives the KPI
//! vocabulary from the sums. Unknown-cohort records are excluded from every
//! grouping; the caller logs the exclusion count.

use std::collections::BTreeMap;

use adkpi_core::fields::{day_key, month_key};
use adkpi_core::metrics::KpiSet;
use adkpi_core::models::{Cohort, CohortTotals, TaggedRecord};

// ── AggregatedGroup ───────────────────────────────────────────────────────────

/// One group of the aggregation output: a cohort, an optional segment key
/// (date, month or ASIN), and the totals plus derived KPIs for that group.
#[derive(Debug, Clone)]
pub struct AggregatedGroup {
    pub cohort: Cohort,
    /// `None` for whole-run cohort aggregation, otherwise the day / month /
    /// ASIN key this group covers.
    pub segment: Option<String>,
    pub totals: CohortTotals,
    pub kpis: KpiSet,
}

// ── CohortAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups tagged records and derives KPIs.
pub struct CohortAggregator;

impl CohortAggregator {
    /// Aggregate by cohort alone.
    pub fn aggregate_by_cohort(records: &[TaggedRecord]) -> Vec<AggregatedGroup> {
        Self::aggregate_with(records, |_| None)
    }

    /// Aggregate by cohort × calendar day. Segment key format: `"%Y-%m-%d"`.
    pub fn aggregate_daily(records: &[TaggedRecord]) -> Vec<AggregatedGroup> {
        Self::aggregate_with(records, |r| Some(day_key(r.record.date)))
    }

    /// Aggregate by cohort × calendar month. Segment key format: `"%Y-%m"`.
    pub fn aggregate_monthly(records: &[TaggedRecord]) -> Vec<AggregatedGroup> {
        Self::aggregate_with(records, |r| Some(month_key(r.record.date)))
    }

    /// Aggregate by cohort × extracted ASIN. Records without an ASIN are
    /// grouped under `"(no ASIN)"` so no known-cohort record is lost.
    pub fn aggregate_by_asin(records: &[TaggedRecord]) -> Vec<AggregatedGroup> {
        Self::aggregate_with(records, |r| {
            Some(
                r.ids
                    .asin
                    .clone()
                    .unwrap_or_else(|| "(no ASIN)".to_string()),
            )
        })
    }

    /// Sum the totals from all groups back into a single [`CohortTotals`].
    ///
    /// Because every KPI is derived from sums, re-deriving a [`KpiSet`] from
    /// this result equals deriving it from the ungrouped records.
    pub fn calculate_totals(groups: &[AggregatedGroup]) -> CohortTotals {
        let mut totals = CohortTotals::default();
        for group in groups {
            totals.merge(&group.totals);
        }
        totals
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Generic aggregation driver.
    ///
    /// `segment_fn` maps a record to its secondary grouping key. Groups come
    /// back sorted by (cohort, segment).
    fn aggregate_with(
        records: &[TaggedRecord],
        segment_fn: impl Fn(&TaggedRecord) -> Option<String>,
    ) -> Vec<AggregatedGroup> {
        // BTreeMap keeps the output deterministically ordered.
        let mut map: BTreeMap<(Cohort, Option<String>), CohortTotals> = BTreeMap::new();

        for tagged in records {
            if !tagged.cohort.is_known() {
                continue;
            }
            let key = (tagged.cohort, segment_fn(tagged));
            map.entry(key).or_default().add_record(&tagged.record);
        }

        map.into_iter()
            .map(|((cohort, segment), totals)| {
                let kpis = KpiSet::from_totals(&totals);
                AggregatedGroup {
                    cohort,
                    segment,
                    totals,
                    kpis,
                }
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use adkpi_core::models::{AdRecord, Identifiers};
    use chrono::NaiveDate;

    fn tagged(
        cohort: Cohort,
        date: &str,
        asin: Option<&str>,
        spend: f64,
        sales: f64,
    ) -> TaggedRecord {
        TaggedRecord {
            record: AdRecord {
                campaign: format!("SP | {} | test", asin.unwrap_or("none")),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                spend,
                sales,
                orders: 1.0,
                clicks: 5.0,
                impressions: 500.0,
                units: 1.0,
            },
            cohort,
            ids: Identifiers {
                asin: asin.map(String::from),
                sku: None,
            },
        }
    }

    // ── aggregate_by_cohort ───────────────────────────────────────────────────

    #[test]
    fn test_cohort_grouping_worked_example() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 100.0, 250.0),
            tagged(Cohort::NonManaged, "2025-12-01", Some("B0N1"), 50.0, 50.0),
        ];
        let groups = CohortAggregator::aggregate_by_cohort(&records);

        assert_eq!(groups.len(), 2);
        let managed = groups.iter().find(|g| g.cohort == Cohort::Managed).unwrap();
        let non = groups
            .iter()
            .find(|g| g.cohort == Cohort::NonManaged)
            .unwrap();

        assert!((managed.kpis.roas - 2.5).abs() < 1e-9);
        assert!((managed.kpis.acos - 0.40).abs() < 1e-9);
        assert!((non.kpis.roas - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_records_excluded() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 100.0, 250.0),
            tagged(Cohort::Unknown, "2025-12-01", None, 999.0, 999.0),
        ];
        let groups = CohortAggregator::aggregate_by_cohort(&records);

        assert_eq!(groups.len(), 1);
        let totals = CohortAggregator::calculate_totals(&groups);
        assert!((totals.spend - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(CohortAggregator::aggregate_by_cohort(&[]).is_empty());
        assert_eq!(CohortAggregator::calculate_totals(&[]).records, 0);
    }

    // ── aggregate_daily / aggregate_monthly ───────────────────────────────────

    #[test]
    fn test_daily_segments_sorted() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-15", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::Managed, "2025-12-08", Some("B0M1"), 10.0, 20.0),
        ];
        let groups = CohortAggregator::aggregate_daily(&records);

        let keys: Vec<&str> = groups
            .iter()
            .map(|g| g.segment.as_deref().unwrap())
            .collect();
        assert_eq!(keys, vec!["2025-12-01", "2025-12-08", "2025-12-15"]);
    }

    #[test]
    fn test_monthly_groups_by_month() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::Managed, "2025-12-20", Some("B0M1"), 30.0, 40.0),
            tagged(Cohort::Managed, "2026-01-02", Some("B0M1"), 5.0, 5.0),
        ];
        let groups = CohortAggregator::aggregate_monthly(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].segment.as_deref(), Some("2025-12"));
        assert_eq!(groups[0].totals.records, 2);
        assert!((groups[0].totals.spend - 40.0).abs() < 1e-9);
        assert_eq!(groups[1].segment.as_deref(), Some("2026-01"));
    }

    #[test]
    fn test_cohorts_kept_separate_within_segment() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::NonManaged, "2025-12-01", Some("B0N1"), 1.0, 2.0),
        ];
        let groups = CohortAggregator::aggregate_daily(&records);
        assert_eq!(groups.len(), 2);
    }

    // ── aggregate_by_asin ─────────────────────────────────────────────────────

    #[test]
    fn test_asin_grouping() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::Managed, "2025-12-02", Some("B0M1"), 10.0, 20.0),
            tagged(Cohort::Managed, "2025-12-02", Some("B0M2"), 5.0, 5.0),
            tagged(Cohort::Managed, "2025-12-02", None, 1.0, 1.0),
        ];
        let groups = CohortAggregator::aggregate_by_asin(&records);

        assert_eq!(groups.len(), 3);
        let m1 = groups
            .iter()
            .find(|g| g.segment.as_deref() == Some("B0M1"))
            .unwrap();
        assert_eq!(m1.totals.records, 2);
        assert!(groups
            .iter()
            .any(|g| g.segment.as_deref() == Some("(no ASIN)")));
    }

    // ── Sum preservation and idempotence ──────────────────────────────────────

    #[test]
    fn test_sum_preservation_across_groupings() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 100.0, 250.0),
            tagged(Cohort::Managed, "2026-01-03", Some("B0M2"), 40.0, 90.0),
            tagged(Cohort::NonManaged, "2025-12-02", Some("B0N1"), 50.0, 50.0),
        ];

        let by_cohort = CohortAggregator::calculate_totals(
            &CohortAggregator::aggregate_by_cohort(&records),
        );
        let by_day =
            CohortAggregator::calculate_totals(&CohortAggregator::aggregate_daily(&records));
        let by_month =
            CohortAggregator::calculate_totals(&CohortAggregator::aggregate_monthly(&records));

        for totals in [&by_day, &by_month] {
            assert!((totals.spend - by_cohort.spend).abs() < 1e-9);
            assert!((totals.sales - by_cohort.sales).abs() < 1e-9);
            assert_eq!(totals.records, by_cohort.records);
        }
        assert_eq!(by_cohort.records, 3);
    }

    #[test]
    fn test_reaggregation_is_idempotent() {
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 100.0, 250.0),
            tagged(Cohort::NonManaged, "2025-12-02", Some("B0N1"), 50.0, 50.0),
        ];
        let groups = CohortAggregator::aggregate_daily(&records);
        let totals = CohortAggregator::calculate_totals(&groups);

        // Re-running the totals pass over a single already-summed group
        // returns the same totals.
        let regrouped = vec![AggregatedGroup {
            cohort: Cohort::Managed,
            segment: None,
            kpis: KpiSet::from_totals(&totals),
            totals: totals.clone(),
        }];
        let again = CohortAggregator::calculate_totals(&regrouped);

        assert!((again.spend - totals.spend).abs() < 1e-9);
        assert!((again.sales - totals.sales).abs() < 1e-9);
        assert_eq!(again.records, totals.records);
    }

    #[test]
    fn test_kpis_derived_from_sums_not_row_averages() {
        // Two rows whose per-row ROAS values (1.0 and 4.0) average to 2.5,
        // but the sum-derived ROAS is 300/150 = 2.0.
        let records = vec![
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 100.0, 100.0),
            tagged(Cohort::Managed, "2025-12-01", Some("B0M1"), 50.0, 200.0),
        ];
        let groups = CohortAggregator::aggregate_by_cohort(&records);
        assert!((groups[0].kpis.roas - 2.0).abs() < 1e-9);
    }
}
