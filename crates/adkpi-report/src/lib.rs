//! Presentation layer for the cohort reporting toolkit.
//!
//! Three presenters over the same analysis results: a multi-sheet XLSX
//! workbook, fixed-width console text, and a machine-readable JSON summary.

pub mod summary;
pub mod text;
pub mod workbook;

pub use summary::ReportSummary;
pub use workbook::{ReportBundle, WorkbookRenderer};
