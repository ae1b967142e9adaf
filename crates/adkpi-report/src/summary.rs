//! Machine-readable JSON summary of a comparison run.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use adkpi_core::Result;
use adkpi_data::analysis::{CohortComparison, CohortSummary, MetricDelta};
use adkpi_data::reference::ReferenceSet;
use serde::Serialize;
use tracing::info;

/// Reference-list sizes recorded alongside the results, so a summary can be
/// audited against the lists that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceCounts {
    pub managed_asins: usize,
    pub managed_skus: usize,
    pub universe_asins: usize,
    pub non_managed_asins: usize,
}

impl From<&ReferenceSet> for ReferenceCounts {
    fn from(refs: &ReferenceSet) -> Self {
        Self {
            managed_asins: refs.managed_asins.len(),
            managed_skus: refs.managed_skus.len(),
            universe_asins: refs.universe_asins.len(),
            non_managed_asins: refs.non_managed_asins.len(),
        }
    }
}

/// The JSON document written next to the workbook after each run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub generated_at: String,
    pub reference: ReferenceCounts,
    pub records_analyzed: u32,
    pub unknown_excluded: usize,
    pub managed: CohortSummary,
    pub non_managed: CohortSummary,
    pub metrics: Vec<MetricDelta>,
}

impl ReportSummary {
    pub fn build(comparison: &CohortComparison, refs: &ReferenceSet) -> Self {
        Self {
            generated_at: comparison.generated_at.clone(),
            reference: ReferenceCounts::from(refs),
            records_analyzed: comparison.records_analyzed,
            unknown_excluded: comparison.unknown_excluded,
            managed: comparison.managed.clone(),
            non_managed: comparison.non_managed.clone(),
            metrics: comparison.deltas.clone(),
        }
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        info!("Wrote summary to {}", path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
