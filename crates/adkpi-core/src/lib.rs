//! Domain types and KPI math for the advertising cohort reporting toolkit.
//!
//! Everything here is pure: record and cohort models, ratio calculations with
//! zero-denominator guards, lenient field parsing, display formatting, and the
//! CLI settings struct. File I/O lives in `adkpi-data`.

pub mod error;
pub mod fields;
pub mod formatting;
pub mod metrics;
pub mod models;
pub mod settings;

pub use error::{ReportError, Result};
