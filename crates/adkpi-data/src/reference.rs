//! Reference list loading.
//!
//! Two side files define cohort membership: a managed identifier list and the
//! full identifier universe. The non-managed set is derived as universe minus
//! managed. Both lists also feed the bidirectional SKU↔ASIN alias maps.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use adkpi_core::{ReportError, Result};
use tracing::{debug, info};

/// Column header for the ASIN cell in the managed list.
const MANAGED_ASIN_COLUMN: &str = "ASIN";
/// Column header for the ASIN cell in the universe list. The export labels
/// this column "informational" and the loader matches it verbatim.
const UNIVERSE_ASIN_COLUMN: &str = "ASIN (Informational only)";
/// Column header for the SKU cell in both lists.
const SKU_COLUMN: &str = "SKU";

// ── ReferenceSet ──────────────────────────────────────────────────────────────

/// The static cohort-membership structures, loaded once per run and never
/// mutated.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    /// ASINs in the managed cohort.
    pub managed_asins: HashSet<String>,
    /// SKUs in the managed cohort.
    pub managed_skus: HashSet<String>,
    /// Every ASIN the account sells.
    pub universe_asins: HashSet<String>,
    /// Universe minus managed.
    pub non_managed_asins: HashSet<String>,
    /// SKU → ASIN alias lookup. Managed-list entries win conflicts.
    pub sku_to_asin: HashMap<String, String>,
    /// ASIN → SKU alias lookup. Managed-list entries win conflicts.
    pub asin_to_sku: HashMap<String, String>,
}

impl ReferenceSet {
    /// Load both lists and derive the non-managed set and alias maps.
    ///
    /// Blank or missing cells are dropped silently; within each list the
    /// first writer wins on a duplicate key. Managed-list alias entries
    /// take precedence over universe-list entries.
    pub fn load(managed_path: &Path, universe_path: &Path) -> Result<Self> {
        let managed_rows = read_id_rows(managed_path, MANAGED_ASIN_COLUMN)?;
        let universe_rows = read_id_rows(universe_path, UNIVERSE_ASIN_COLUMN)?;

        let mut refs = ReferenceSet::default();

        // Managed pass first: its alias entries take the slot before the
        // universe pass gets a chance, and within the list the first row
        // holding a key keeps it.
        for (asin, sku) in &managed_rows {
            if let Some(asin) = asin {
                refs.managed_asins.insert(asin.clone());
            }
            if let Some(sku) = sku {
                refs.managed_skus.insert(sku.clone());
            }
            if let (Some(asin), Some(sku)) = (asin, sku) {
                refs.sku_to_asin.entry(sku.clone()).or_insert_with(|| asin.clone());
                refs.asin_to_sku.entry(asin.clone()).or_insert_with(|| sku.clone());
            }
        }

        for (asin, sku) in &universe_rows {
            if let Some(asin) = asin {
                refs.universe_asins.insert(asin.clone());
            }
            if let (Some(asin), Some(sku)) = (asin, sku) {
                refs.sku_to_asin.entry(sku.clone()).or_insert_with(|| asin.clone());
                refs.asin_to_sku.entry(asin.clone()).or_insert_with(|| sku.clone());
            }
        }

        refs.non_managed_asins = refs
            .universe_asins
            .difference(&refs.managed_asins)
            .cloned()
            .collect();

        info!(
            "Loaded references: {} managed, {} universe, {} non-managed, {} alias mappings",
            refs.managed_asins.len(),
            refs.universe_asins.len(),
            refs.non_managed_asins.len(),
            refs.sku_to_asin.len(),
        );

        Ok(refs)
    }

    /// Resolve a SKU to its ASIN through the alias map.
    pub fn resolve_sku(&self, sku: &str) -> Option<&str> {
        self.sku_to_asin.get(sku).map(String::as_str)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Read `(asin, sku)` pairs from a reference CSV. Either side of a pair may
/// be absent; fully blank rows are skipped.
fn read_id_rows(path: &Path, asin_column: &str) -> Result<Vec<(Option<String>, Option<String>)>> {
    let file = std::fs::File::open(path).map_err(|source| ReportError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ReportError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();

    let asin_idx = column_index(&headers, asin_column).ok_or_else(|| {
        ReportError::MissingColumn {
            path: path.to_path_buf(),
            column: asin_column.to_string(),
        }
    })?;
    // The SKU column is optional in older exports.
    let sku_idx = column_index(&headers, SKU_COLUMN);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping malformed reference row in {}: {}", path.display(), e);
                continue;
            }
        };
        let asin = non_blank(record.get(asin_idx));
        let sku = sku_idx.and_then(|i| non_blank(record.get(i)));
        if asin.is_none() && sku.is_none() {
            continue;
        }
        rows.push((asin, sku));
    }

    Ok(rows)
}

/// Exact-match header lookup. The column-name contract has no tolerance for
/// renames, only for surrounding whitespace.
pub(crate) fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name.trim())
}

fn non_blank(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
