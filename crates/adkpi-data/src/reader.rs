//! Report file discovery and loading.
//!
//! Reads advertising CSV exports and tab-delimited order report files into
//! typed records for downstream classification and aggregation. Row-level
//! problems (bad dates, non-numeric cells) are coerced or skipped, never
//! surfaced as errors; only a missing file or a missing column is fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use adkpi_core::fields::{DateField, NumericField};
use adkpi_core::models::{AdRecord, OrderLine};
use adkpi_core::{ReportError, Result};
use tracing::{debug, warn};

use crate::reference::column_index;

// ── Advertising CSV ───────────────────────────────────────────────────────────

/// Column header for the record label in campaign-level exports.
const CAMPAIGN_COLUMN: &str = "Campaign Name";
/// Label fallback used by advertised-product exports.
const ADVERTISED_ASIN_COLUMN: &str = "Advertised ASIN";
const DATE_COLUMN: &str = "Date";
const SPEND_COLUMN: &str = "Spend";
const CLICKS_COLUMN: &str = "Clicks";
const IMPRESSIONS_COLUMN: &str = "Impressions";
// The export ships these headers verbatim, trailing space and all.
const ORDERS_COLUMN: &str = "7 Day Total Orders (#)";
const SALES_COLUMN: &str = "7 Day Total Sales ";
const UNITS_COLUMN: &str = "7 Day Total Units (#)";

/// Load an advertising report CSV into [`AdRecord`]s.
///
/// The label column is `"Campaign Name"`, falling back to
/// `"Advertised ASIN"` for product-level exports. Rows without a parseable
/// date are dropped; numeric cells are cleaned and coerced to 0.
pub fn load_ad_records(path: &Path) -> Result<Vec<AdRecord>> {
    let file = std::fs::File::open(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ReportError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();

    let label_idx = column_index(&headers, CAMPAIGN_COLUMN)
        .or_else(|| column_index(&headers, ADVERTISED_ASIN_COLUMN))
        .ok_or_else(|| ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: CAMPAIGN_COLUMN.to_string(),
        })?;
    let date_idx = column_index(&headers, DATE_COLUMN).ok_or_else(|| {
        ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: DATE_COLUMN.to_string(),
        }
    })?;
    let spend_idx = column_index(&headers, SPEND_COLUMN);
    let clicks_idx = column_index(&headers, CLICKS_COLUMN);
    let impressions_idx = column_index(&headers, IMPRESSIONS_COLUMN);
    let orders_idx = column_index(&headers, ORDERS_COLUMN);
    let sales_idx = column_index(&headers, SALES_COLUMN);
    let units_idx = column_index(&headers, UNITS_COLUMN);

    let mut records = Vec::new();
    let mut rows_read = 0u64;
    let mut rows_dropped = 0u64;

    for result in reader.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed row in {}: {}", path.display(), e);
                rows_dropped += 1;
                continue;
            }
        };
        rows_read += 1;

        let date = match row.get(date_idx).and_then(DateField::parse) {
            Some(d) => d,
            None => {
                rows_dropped += 1;
                continue;
            }
        };

        let numeric = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(NumericField::parse)
                .unwrap_or(0.0)
        };

        records.push(AdRecord {
            campaign: row.get(label_idx).unwrap_or_default().trim().to_string(),
            date,
            spend: numeric(spend_idx),
            sales: numeric(sales_idx),
            orders: numeric(orders_idx),
            clicks: numeric(clicks_idx),
            impressions: numeric(impressions_idx),
            units: numeric(units_idx),
        });
    }

    records.sort_by_key(|r| r.date);

    debug!(
        "Loaded {} of {} advertising rows from {} ({} dropped)",
        records.len(),
        rows_read,
        path.display(),
        rows_dropped,
    );

    Ok(records)
}

// ── Order reports ─────────────────────────────────────────────────────────────

const ORDER_ID_COLUMN: &str = "amazon-order-id";
const ORDER_SKU_COLUMN: &str = "sku";
const ORDER_ASIN_COLUMN: &str = "asin";
const ORDER_STATUS_COLUMN: &str = "order-status";
const PURCHASE_DATE_COLUMN: &str = "purchase-date";
const ITEM_PRICE_COLUMN: &str = "item-price";
const QUANTITY_COLUMN: &str = "quantity";

/// Find all `.txt` order report files under `dir`, sorted by path.
pub fn find_order_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Order directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "txt")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every order report under `dir` into [`OrderLine`]s.
///
/// Keeps shipped lines with a positive price and a parseable purchase date.
/// Duplicate lines (same order id, SKU and quantity) across all files are
/// dropped, matching the overlap between consecutive monthly exports.
pub fn load_order_lines(dir: &Path) -> Result<Vec<OrderLine>> {
    let files = find_order_files(dir);
    if files.is_empty() {
        return Err(ReportError::NoOrderFiles(dir.to_path_buf()));
    }

    let mut lines: Vec<OrderLine> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for file_path in &files {
        let loaded = load_single_order_file(file_path, &mut seen)?;
        lines.extend(loaded);
    }

    lines.sort_by_key(|l| l.purchase_date);

    debug!(
        "Loaded {} order lines from {} files",
        lines.len(),
        files.len()
    );

    Ok(lines)
}

fn load_single_order_file(path: &Path, seen: &mut HashSet<String>) -> Result<Vec<OrderLine>> {
    let file = std::fs::File::open(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ReportError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();

    let idx = |name: &str| {
        column_index(&headers, name).ok_or_else(|| ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    };
    let order_id_idx = idx(ORDER_ID_COLUMN)?;
    let sku_idx = idx(ORDER_SKU_COLUMN)?;
    let status_idx = idx(ORDER_STATUS_COLUMN)?;
    let date_idx = idx(PURCHASE_DATE_COLUMN)?;
    let price_idx = idx(ITEM_PRICE_COLUMN)?;
    let quantity_idx = idx(QUANTITY_COLUMN)?;
    let asin_idx = column_index(&headers, ORDER_ASIN_COLUMN);

    let mut lines = Vec::new();
    let mut rows_filtered = 0u64;
    let mut duplicates = 0u64;

    for result in reader.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed order row in {}: {}", path.display(), e);
                continue;
            }
        };

        if row.get(status_idx).map(str::trim) != Some("Shipped") {
            rows_filtered += 1;
            continue;
        }

        let purchase_date = match row.get(date_idx).and_then(DateField::parse) {
            Some(d) => d,
            None => {
                rows_filtered += 1;
                continue;
            }
        };

        let item_price = row.get(price_idx).map(NumericField::parse).unwrap_or(0.0);
        if item_price <= 0.0 {
            rows_filtered += 1;
            continue;
        }

        let order_id = row.get(order_id_idx).unwrap_or_default().trim().to_string();
        let sku = row.get(sku_idx).unwrap_or_default().trim().to_string();
        let quantity = row.get(quantity_idx).map(NumericField::parse).unwrap_or(0.0);

        let dedup_key = format!("{}:{}:{}", order_id, sku, quantity);
        if !seen.insert(dedup_key) {
            duplicates += 1;
            continue;
        }

        lines.push(OrderLine {
            order_id,
            sku,
            asin: asin_idx
                .and_then(|i| row.get(i))
                .unwrap_or_default()
                .trim()
                .to_string(),
            purchase_date,
            item_price,
            quantity,
        });
    }

    debug!(
        "File {}: {} kept, {} filtered, {} duplicates",
        path.display(),
        lines.len(),
        rows_filtered,
        duplicates,
    );

    Ok(lines)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
