use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Cohort KPI reporting over advertising and order report exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "adkpi",
    about = "Classify advertising records into managed / non-managed cohorts and report KPIs",
    version
)]
pub struct Settings {
    /// Advertising report CSV (campaign or advertised-product export)
    #[arg(long)]
    pub ads_file: PathBuf,

    /// Managed identifier list CSV (columns: ASIN, SKU)
    #[arg(long)]
    pub managed_list: PathBuf,

    /// Identifier universe list CSV (columns: "ASIN (Informational only)", SKU)
    #[arg(long)]
    pub universe_list: PathBuf,

    /// Directory of tab-delimited order report files (enables TACoS metrics)
    #[arg(long)]
    pub orders_dir: Option<PathBuf>,

    /// Which report to produce
    #[arg(long, default_value = "all", value_parser = ["comparison", "asin", "monthly", "prepost", "all"])]
    pub report: String,

    /// Managed-advertising launch date for the pre/post report (YYYY-MM-DD)
    #[arg(long)]
    pub launch_date: Option<NaiveDate>,

    /// Length of the pre-launch comparison window in days
    #[arg(long, default_value = "30")]
    pub pre_window_days: i64,

    /// Output directory (defaults to ./outputs)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Skip writing the XLSX workbook
    #[arg(long)]
    pub no_workbook: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

impl Settings {
    /// Resolve the output directory, defaulting to `outputs/` under the
    /// current working directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("outputs"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "adkpi",
            "--ads-file",
            "ads.csv",
            "--managed-list",
            "managed.csv",
            "--universe-list",
            "universe.csv",
        ]
    }

    #[test]
    fn test_defaults() {
        let s = Settings::parse_from(base_args());
        assert_eq!(s.report, "all");
        assert_eq!(s.log_level, "INFO");
        assert_eq!(s.pre_window_days, 30);
        assert!(s.orders_dir.is_none());
        assert!(!s.no_workbook);
    }

    #[test]
    fn test_report_value_parser_rejects_unknown() {
        let result = Settings::try_parse_from({
            let mut a = base_args();
            a.extend(["--report", "weekly"]);
            a
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_launch_date_parses_iso() {
        let s = Settings::parse_from({
            let mut a = base_args();
            a.extend(["--launch-date", "2025-12-15"]);
            a
        });
        assert_eq!(
            s.launch_date,
            Some(NaiveDate::from_ymd_opt(2025, 12, 15).unwrap())
        );
    }

    #[test]
    fn test_resolved_output_dir_default() {
        let s = Settings::parse_from(base_args());
        assert_eq!(s.resolved_output_dir(), PathBuf::from("outputs"));
    }

    #[test]
    fn test_resolved_output_dir_explicit() {
        let s = Settings::parse_from({
            let mut a = base_args();
            a.extend(["--output-dir", "/tmp/reports"]);
            a
        });
        assert_eq!(s.resolved_output_dir(), PathBuf::from("/tmp/reports"));
    }
}
