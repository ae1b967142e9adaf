//! Data ingestion and aggregation layer for the cohort reporting toolkit.
//!
//! Responsible for reading advertising CSV and tab-delimited order report
//! exports, loading the managed/universe reference lists, classifying records
//! into cohorts, aggregating KPIs and running the top-level analysis
//! pipelines.

pub mod aggregator;
pub mod analysis;
pub mod classifier;
pub mod reader;
pub mod reference;
