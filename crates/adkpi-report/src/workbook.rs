//! Multi-sheet XLSX workbook renderer.
//!
//! One sheet per analysis: the cohort comparison, the monthly trend, the
//! TACoS table when order data is available, and the pre/post launch split
//! when a launch date was given.

use std::path::Path;

use adkpi_core::{ReportError, Result};
use adkpi_data::aggregator::AggregatedGroup;
use adkpi_data::analysis::{
    CohortComparison, MetricDelta, MonthlyTacos, MonthlyTrendRow, PeriodMetrics, PrePostAnalysis,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

/// Analysis results collected for presentation. Optional sections are simply
/// skipped by every presenter.
#[derive(Debug, Clone, Copy)]
pub struct ReportBundle<'a> {
    pub comparison: &'a CohortComparison,
    pub monthly: &'a [MonthlyTrendRow],
    pub asin: Option<&'a [AggregatedGroup]>,
    pub tacos: Option<&'a [MonthlyTacos]>,
    pub pre_post: Option<&'a PrePostAnalysis>,
}

fn xlsx_err(e: XlsxError) -> ReportError {
    ReportError::Workbook(e.to_string())
}

/// Reusable cell formats, created once per workbook.
struct Formats {
    header: Format,
    text: Format,
    currency: Format,
    percent: Format,
    number: Format,
    integer: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            text: Format::new(),
            currency: Format::new().set_num_format("$#,##0.00"),
            percent: Format::new().set_num_format("0.0%"),
            number: Format::new().set_num_format("#,##0.00"),
            integer: Format::new().set_num_format("#,##0"),
        }
    }

    /// Pick the cell format for a comparison metric by name.
    fn for_metric(&self, name: &str) -> &Format {
        match name {
            "Spend" | "Sales" | "CPC" | "CPA" | "CPM" | "AOV" => &self.currency,
            "ACOS" | "CTR" | "CVR" => &self.percent,
            "Orders" => &self.integer,
            _ => &self.number,
        }
    }
}

/// Renders a [`ReportBundle`] to an XLSX file.
pub struct WorkbookRenderer;

impl WorkbookRenderer {
    /// Write the workbook to `path`.
    pub fn render(bundle: &ReportBundle<'_>, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let formats = Formats::new();

        Self::add_comparison_sheet(&mut workbook, bundle.comparison, &formats)?;
        Self::add_monthly_sheet(&mut workbook, bundle.monthly, &formats)?;
        if let Some(asin) = bundle.asin {
            Self::add_asin_sheet(&mut workbook, asin, &formats)?;
        }
        if let Some(tacos) = bundle.tacos {
            Self::add_tacos_sheet(&mut workbook, tacos, &formats)?;
        }
        if let Some(pre_post) = bundle.pre_post {
            Self::add_pre_post_sheet(&mut workbook, pre_post, &formats)?;
        }

        workbook.save(path).map_err(xlsx_err)?;
        info!("Wrote workbook to {}", path.display());
        Ok(())
    }

    fn write_headers(sheet: &mut Worksheet, headers: &[&str], formats: &Formats) -> Result<()> {
        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(xlsx_err)?;
            sheet.set_column_width(col as u16, 16).ok();
        }
        Ok(())
    }

    fn add_comparison_sheet(
        workbook: &mut Workbook,
        comparison: &CohortComparison,
        formats: &Formats,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Comparison").map_err(xlsx_err)?;

        let headers = [
            "Metric",
            "Managed",
            "Non-Managed",
            "Delta",
            "Improvement %",
            "Winner",
        ];
        Self::write_headers(sheet, &headers, formats)?;
        sheet.set_column_width(0, 14).ok();

        for (i, delta) in comparison.deltas.iter().enumerate() {
            let row = (i + 1) as u32;
            Self::write_delta_row(sheet, row, delta, formats)?;
        }

        // Footnote with run context below the table.
        let note_row = comparison.deltas.len() as u32 + 2;
        let note = format!(
            "{} records analyzed, {} unmatched excluded, generated {}",
            comparison.records_analyzed, comparison.unknown_excluded, comparison.generated_at
        );
        sheet
            .write_with_format(note_row, 0, note, &formats.text)
            .map_err(xlsx_err)?;

        Ok(())
    }

    fn write_delta_row(
        sheet: &mut Worksheet,
        row: u32,
        delta: &MetricDelta,
        formats: &Formats,
    ) -> Result<()> {
        let value_format = formats.for_metric(delta.name);

        sheet
            .write_with_format(row, 0, delta.name, &formats.text)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 1, delta.managed, value_format)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 2, delta.non_managed, value_format)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(row, 3, delta.delta, value_format)
            .map_err(xlsx_err)?;
        if let Some(pct) = delta.improvement_pct {
            sheet
                .write_with_format(row, 4, pct / 100.0, &formats.percent)
                .map_err(xlsx_err)?;
        }
        let winner = delta.winner.map(|c| c.label()).unwrap_or("-");
        sheet
            .write_with_format(row, 5, winner, &formats.text)
            .map_err(xlsx_err)?;
        Ok(())
    }

    fn add_monthly_sheet(
        workbook: &mut Workbook,
        rows: &[MonthlyTrendRow],
        formats: &Formats,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Monthly Trend").map_err(xlsx_err)?;

        let headers = [
            "Month",
            "Cohort",
            "Spend",
            "Sales",
            "Orders",
            "Clicks",
            "Impressions",
            "ROAS",
            "ACOS",
            "CPC",
            "CTR",
            "Spend MoM %",
            "Sales MoM %",
        ];
        Self::write_headers(sheet, &headers, formats)?;

        for (i, trend) in rows.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet
                .write_with_format(row, 0, &trend.month, &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, trend.cohort.label(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, trend.totals.spend, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, trend.totals.sales, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, trend.totals.orders, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, trend.totals.clicks, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 6, trend.totals.impressions, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 7, trend.kpis.roas, &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 8, trend.kpis.acos, &formats.percent)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 9, trend.kpis.cpc, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 10, trend.kpis.ctr, &formats.percent)
                .map_err(xlsx_err)?;
            if let Some(pct) = trend.spend_mom_pct {
                sheet
                    .write_with_format(row, 11, pct / 100.0, &formats.percent)
                    .map_err(xlsx_err)?;
            }
            if let Some(pct) = trend.sales_mom_pct {
                sheet
                    .write_with_format(row, 12, pct / 100.0, &formats.percent)
                    .map_err(xlsx_err)?;
            }
        }

        Ok(())
    }

    fn add_asin_sheet(
        workbook: &mut Workbook,
        groups: &[AggregatedGroup],
        formats: &Formats,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("By ASIN").map_err(xlsx_err)?;

        let headers = [
            "ASIN", "Cohort", "Records", "Spend", "Sales", "Orders", "Clicks", "ROAS", "ACOS",
            "CPC",
        ];
        Self::write_headers(sheet, &headers, formats)?;

        for (i, group) in groups.iter().enumerate() {
            let row = (i + 1) as u32;
            let asin = group.segment.as_deref().unwrap_or("(no ASIN)");
            sheet
                .write_with_format(row, 0, asin, &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, group.cohort.label(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, group.totals.records, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, group.totals.spend, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, group.totals.sales, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, group.totals.orders, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 6, group.totals.clicks, &formats.integer)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 7, group.kpis.roas, &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 8, group.kpis.acos, &formats.percent)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 9, group.kpis.cpc, &formats.currency)
                .map_err(xlsx_err)?;
        }

        Ok(())
    }

    fn add_tacos_sheet(
        workbook: &mut Workbook,
        rows: &[MonthlyTacos],
        formats: &Formats,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TACoS").map_err(xlsx_err)?;

        let headers = [
            "Month",
            "Ad Spend",
            "Ad Sales",
            "Total Revenue",
            "Organic Sales",
            "TACoS",
            "T-ROAS",
            "Organic %",
        ];
        Self::write_headers(sheet, &headers, formats)?;

        for (i, tacos) in rows.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet
                .write_with_format(row, 0, &tacos.month, &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, tacos.spend, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, tacos.ad_sales, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, tacos.total_revenue, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, tacos.revenue.organic_sales, &formats.currency)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, tacos.revenue.tacos, &formats.percent)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 6, tacos.revenue.t_roas, &formats.number)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 7, tacos.revenue.organic_ratio, &formats.percent)
                .map_err(xlsx_err)?;
        }

        Ok(())
    }

    fn add_pre_post_sheet(
        workbook: &mut Workbook,
        analysis: &PrePostAnalysis,
        formats: &Formats,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Pre vs Post").map_err(xlsx_err)?;

        let headers = ["Metric", "Pre-launch", "Post-launch"];
        Self::write_headers(sheet, &headers, formats)?;
        sheet.set_column_width(0, 20).ok();

        sheet
            .write_with_format(
                1,
                0,
                format!("Launch date: {}", analysis.launch_date),
                &formats.text,
            )
            .map_err(xlsx_err)?;

        let metric_rows = Self::period_rows(&analysis.pre, &analysis.post);
        for (i, (label, pre, post, kind)) in metric_rows.iter().enumerate() {
            let row = (i + 2) as u32;
            let format = match kind {
                PeriodCell::Currency => &formats.currency,
                PeriodCell::Percent => &formats.percent,
                PeriodCell::Number => &formats.number,
                PeriodCell::Integer => &formats.integer,
            };
            sheet
                .write_with_format(row, 0, *label, &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, *pre, format)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, *post, format)
                .map_err(xlsx_err)?;
        }

        Ok(())
    }

    /// Flatten the two periods into (label, pre, post, cell kind) rows.
    fn period_rows(
        pre: &PeriodMetrics,
        post: &PeriodMetrics,
    ) -> Vec<(&'static str, f64, f64, PeriodCell)> {
        let mut rows = vec![
            ("Days", pre.days as f64, post.days as f64, PeriodCell::Integer),
            ("Spend", pre.totals.spend, post.totals.spend, PeriodCell::Currency),
            ("Sales", pre.totals.sales, post.totals.sales, PeriodCell::Currency),
            ("Orders", pre.totals.orders, post.totals.orders, PeriodCell::Integer),
            ("Clicks", pre.totals.clicks, post.totals.clicks, PeriodCell::Integer),
            ("ROAS", pre.kpis.roas, post.kpis.roas, PeriodCell::Number),
            ("ACOS", pre.kpis.acos, post.kpis.acos, PeriodCell::Percent),
            ("CPC", pre.kpis.cpc, post.kpis.cpc, PeriodCell::Currency),
            (
                "Avg daily spend",
                pre.avg_daily_spend,
                post.avg_daily_spend,
                PeriodCell::Currency,
            ),
            (
                "Avg daily sales",
                pre.avg_daily_sales,
                post.avg_daily_sales,
                PeriodCell::Currency,
            ),
        ];
        if let (Some(pre_rev), Some(post_rev)) = (pre.total_revenue, post.total_revenue) {
            rows.push(("Total revenue", pre_rev, post_rev, PeriodCell::Currency));
        }
        if let (Some(pre_k), Some(post_k)) = (&pre.revenue, &post.revenue) {
            rows.push(("TACoS", pre_k.tacos, post_k.tacos, PeriodCell::Percent));
            rows.push((
                "Organic sales",
                pre_k.organic_sales,
                post_k.organic_sales,
                PeriodCell::Currency,
            ));
        }
        rows
    }
}

enum PeriodCell {
    Currency,
    Percent,
    Number,
    Integer,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
