mod bootstrap;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;

use adkpi_core::settings::Settings;
use adkpi_core::ReportError;
use adkpi_data::aggregator::{AggregatedGroup, CohortAggregator};
use adkpi_data::analysis::{self, MonthlyTacos, PrePostAnalysis};
use adkpi_data::{reader, reference::ReferenceSet};
use adkpi_report::{text, ReportBundle, ReportSummary, WorkbookRenderer};

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(&settings.log_level)?;
    tracing::info!("adkpi v{} starting", env!("CARGO_PKG_VERSION"));

    let output_dir = settings.resolved_output_dir();
    bootstrap::ensure_output_dir(&output_dir)?;

    if !settings.ads_file.exists() {
        return Err(ReportError::InputNotFound(settings.ads_file.clone()).into());
    }

    let refs = ReferenceSet::load(&settings.managed_list, &settings.universe_list)?;
    let records = reader::load_ad_records(&settings.ads_file)?;
    let data = analysis::classify_records(records, &refs);

    let orders = match &settings.orders_dir {
        Some(dir) => Some(reader::load_order_lines(dir)?),
        None => None,
    };

    let report = settings.report.as_str();
    let all = report == "all";

    let comparison = analysis::compare_cohorts(&data);
    let monthly = analysis::monthly_trend(&data);

    let by_asin: Option<Vec<AggregatedGroup>> =
        (all || report == "asin").then(|| CohortAggregator::aggregate_by_asin(&data.tagged));

    let tacos: Option<Vec<MonthlyTacos>> = match orders.as_deref() {
        Some(lines) if all || report == "monthly" => Some(analysis::monthly_tacos(&data, lines)),
        _ => None,
    };

    let pre_post: Option<PrePostAnalysis> = if all || report == "prepost" {
        match settings.launch_date {
            Some(launch) => Some(analysis::pre_post_analysis(
                &data,
                orders.as_deref(),
                launch,
                settings.pre_window_days,
            )),
            None if report == "prepost" => {
                return Err(ReportError::Config(
                    "--launch-date is required for the prepost report".to_string(),
                )
                .into());
            }
            None => {
                tracing::debug!("No launch date given; skipping pre/post analysis");
                None
            }
        }
    } else {
        None
    };

    let bundle = ReportBundle {
        comparison: &comparison,
        monthly: &monthly,
        asin: by_asin.as_deref(),
        tacos: tacos.as_deref(),
        pre_post: pre_post.as_ref(),
    };

    // Console output first, then file artifacts.
    let out = if all {
        text::render_report(&bundle)
    } else {
        let mut out = String::new();
        if report == "comparison" {
            text::render_comparison(&mut out, &comparison);
        }
        if report == "monthly" {
            text::render_monthly_trend(&mut out, &monthly);
            if let Some(rows) = &tacos {
                text::render_tacos(&mut out, rows);
            }
        }
        if let Some(groups) = &by_asin {
            text::render_asin_breakdown(&mut out, groups);
        }
        if let Some(pp) = &pre_post {
            text::render_pre_post(&mut out, pp);
        }
        out
    };
    print!("{out}");

    let stamp = Utc::now().format("%Y%m%d");

    if !settings.no_workbook {
        let workbook_path = output_dir.join(format!("cohort_report_{stamp}.xlsx"));
        WorkbookRenderer::render(&bundle, &workbook_path)?;
    }

    let summary_path = output_dir.join(format!("cohort_summary_{stamp}.json"));
    ReportSummary::build(&comparison, &refs).write_json(&summary_path)?;

    tracing::info!("Done; artifacts written to {}", output_dir.display());
    Ok(())
}
