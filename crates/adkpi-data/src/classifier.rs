//! Cohort classification from free-text campaign labels.
//!
//! A label carries at most two identifiers: a 10-character ASIN and a short
//! alphanumeric SKU. Membership is resolved against the reference sets with
//! the ASIN tried first, then the SKU (directly, then through the alias map).

use adkpi_core::models::{Cohort, Identifiers};
use regex::Regex;

use crate::reference::ReferenceSet;

/// The outcome of classifying one record label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub cohort: Cohort,
    pub ids: Identifiers,
}

// ── CohortClassifier ──────────────────────────────────────────────────────────

/// Extracts identifiers from labels and resolves cohort membership.
///
/// Pure with respect to its inputs: the same label and reference set always
/// produce the same outcome.
pub struct CohortClassifier {
    asin_pattern: Regex,
    sku_pattern: Regex,
}

impl Default for CohortClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CohortClassifier {
    pub fn new() -> Self {
        Self {
            // 10-character product code: B followed by 9 alphanumerics.
            asin_pattern: Regex::new(r"B[A-Z0-9]{9}").expect("regex is valid"),
            // Merchant code families seen in campaign names: NT12780A, SD1511, PN204.
            sku_pattern: Regex::new(r"(NT|SD|PN)\d+[A-Z]?").expect("regex is valid"),
        }
    }

    /// Extract the ASIN and SKU substrings from a label, if present.
    pub fn extract_identifiers(&self, label: &str) -> Identifiers {
        Identifiers {
            asin: self
                .asin_pattern
                .find(label)
                .map(|m| m.as_str().to_string()),
            sku: self.sku_pattern.find(label).map(|m| m.as_str().to_string()),
        }
    }

    /// Classify a record label into a cohort.
    ///
    /// Resolution order:
    /// 1. Extracted ASIN in the managed set → Managed.
    /// 2. Extracted ASIN in the non-managed set → NonManaged.
    /// 3. Extracted SKU in the managed SKU set → Managed (ASIN filled from
    ///    the alias map when available).
    /// 4. SKU resolved through the alias map, mapped ASIN re-tested against
    ///    both sets.
    /// 5. Otherwise Unknown. No partial or fuzzy matching.
    pub fn classify(&self, label: &str, refs: &ReferenceSet) -> Classification {
        let mut ids = self.extract_identifiers(label);

        if let Some(asin) = &ids.asin {
            if refs.managed_asins.contains(asin) {
                return Classification {
                    cohort: Cohort::Managed,
                    ids,
                };
            }
            if refs.non_managed_asins.contains(asin) {
                return Classification {
                    cohort: Cohort::NonManaged,
                    ids,
                };
            }
        }

        if let Some(sku) = ids.sku.clone() {
            if refs.managed_skus.contains(&sku) {
                if ids.asin.is_none() {
                    ids.asin = refs.resolve_sku(&sku).map(String::from);
                }
                return Classification {
                    cohort: Cohort::Managed,
                    ids,
                };
            }
            if let Some(mapped) = refs.resolve_sku(&sku) {
                let mapped = mapped.to_string();
                if refs.managed_asins.contains(&mapped) {
                    ids.asin = Some(mapped);
                    return Classification {
                        cohort: Cohort::Managed,
                        ids,
                    };
                }
                if refs.non_managed_asins.contains(&mapped) {
                    ids.asin = Some(mapped);
                    return Classification {
                        cohort: Cohort::NonManaged,
                        ids,
                    };
                }
            }
        }

        Classification {
            cohort: Cohort::Unknown,
            ids,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
