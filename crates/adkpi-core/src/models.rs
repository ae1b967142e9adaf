use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which advertising cohort a record belongs to.
///
/// Managed campaigns run under the managed advertising tool; non-managed
/// campaigns are run by hand. Records whose identifier matches neither
/// reference list are `Unknown` and excluded from cohort comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cohort {
    Managed,
    NonManaged,
    Unknown,
}

impl Cohort {
    /// Human-readable label used in reports and file output.
    pub fn label(&self) -> &'static str {
        match self {
            Cohort::Managed => "Managed",
            Cohort::NonManaged => "Non-Managed",
            Cohort::Unknown => "Unknown",
        }
    }

    /// Whether this record should enter cohort comparison tables.
    pub fn is_known(&self) -> bool {
        !matches!(self, Cohort::Unknown)
    }
}

impl std::fmt::Display for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One advertising report line.
///
/// Numeric fields arrive pre-cleaned: currency and percent symbols stripped,
/// unparseable values coerced to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdRecord {
    /// Free-text campaign label; identifiers are extracted from it.
    pub campaign: String,
    /// Report date for this line.
    pub date: NaiveDate,
    /// Advertising spend in USD.
    pub spend: f64,
    /// Attributed sales in USD.
    pub sales: f64,
    /// Attributed order count.
    #[serde(default)]
    pub orders: f64,
    /// Ad clicks.
    #[serde(default)]
    pub clicks: f64,
    /// Ad impressions.
    #[serde(default)]
    pub impressions: f64,
    /// Attributed units sold.
    #[serde(default)]
    pub units: f64,
}

/// Identifiers extracted from a campaign label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    /// 10-character product code, e.g. `B0ABCD1234`.
    pub asin: Option<String>,
    /// Short alphanumeric merchant code, e.g. `NT12780A`.
    pub sku: Option<String>,
}

/// An advertising record tagged with its classification outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub record: AdRecord,
    pub cohort: Cohort,
    pub ids: Identifiers,
}

/// One order report line, post-filtering.
///
/// Only shipped lines with a positive price and a parseable purchase date
/// survive ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Marketplace order identifier, used for de-duplication.
    pub order_id: String,
    /// Merchant code for the ordered item.
    pub sku: String,
    /// Product code for the ordered item.
    #[serde(default)]
    pub asin: String,
    /// Calendar date the order was placed.
    pub purchase_date: NaiveDate,
    /// Per-unit item price in USD.
    pub item_price: f64,
    /// Units ordered on this line.
    pub quantity: f64,
}

impl OrderLine {
    /// Revenue for this line: price × quantity.
    pub fn revenue(&self) -> f64 {
        self.item_price * self.quantity
    }
}

/// Summed numerator fields accumulated across multiple advertising records.
///
/// All derived ratios are computed from these sums, never averaged per-row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CohortTotals {
    pub spend: f64,
    pub sales: f64,
    pub orders: f64,
    pub clicks: f64,
    pub impressions: f64,
    pub units: f64,
    /// Number of records folded into these totals.
    pub records: u32,
}

impl CohortTotals {
    /// Add a single record's numerators to the running totals.
    pub fn add_record(&mut self, record: &AdRecord) {
        self.spend += record.spend;
        self.sales += record.sales;
        self.orders += record.orders;
        self.clicks += record.clicks;
        self.impressions += record.impressions;
        self.units += record.units;
        self.records += 1;
    }

    /// Fold another totals struct into this one.
    pub fn merge(&mut self, other: &CohortTotals) {
        self.spend += other.spend;
        self.sales += other.sales;
        self.orders += other.orders;
        self.clicks += other.clicks;
        self.impressions += other.impressions;
        self.units += other.units;
        self.records += other.records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(spend: f64, sales: f64) -> AdRecord {
        AdRecord {
            campaign: "SP | B0TEST1234 | exact".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            spend,
            sales,
            orders: 2.0,
            clicks: 10.0,
            impressions: 1000.0,
            units: 3.0,
        }
    }

    #[test]
    fn test_cohort_labels() {
        assert_eq!(Cohort::Managed.label(), "Managed");
        assert_eq!(Cohort::NonManaged.label(), "Non-Managed");
        assert_eq!(Cohort::Unknown.label(), "Unknown");
    }

    #[test]
    fn test_cohort_is_known() {
        assert!(Cohort::Managed.is_known());
        assert!(Cohort::NonManaged.is_known());
        assert!(!Cohort::Unknown.is_known());
    }

    #[test]
    fn test_order_line_revenue() {
        let line = OrderLine {
            order_id: "111-222".to_string(),
            sku: "NT12780A".to_string(),
            asin: "B0ABCD1234".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 12, 5).unwrap(),
            item_price: 19.99,
            quantity: 3.0,
        };
        assert!((line.revenue() - 59.97).abs() < 1e-9);
    }

    #[test]
    fn test_totals_add_record() {
        let mut totals = CohortTotals::default();
        totals.add_record(&sample_record(100.0, 250.0));
        totals.add_record(&sample_record(50.0, 50.0));

        assert!((totals.spend - 150.0).abs() < 1e-9);
        assert!((totals.sales - 300.0).abs() < 1e-9);
        assert!((totals.orders - 4.0).abs() < 1e-9);
        assert_eq!(totals.records, 2);
    }

    #[test]
    fn test_totals_merge() {
        let mut a = CohortTotals::default();
        a.add_record(&sample_record(100.0, 250.0));
        let mut b = CohortTotals::default();
        b.add_record(&sample_record(50.0, 50.0));

        a.merge(&b);
        assert!((a.spend - 150.0).abs() < 1e-9);
        assert_eq!(a.records, 2);
    }
}
