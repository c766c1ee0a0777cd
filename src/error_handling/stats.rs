//! Per-category failure counters.
//!
//! Only categories that have actually been observed get an entry, so the map
//! stays as small as the set of distinct failures a host produces.

use std::collections::{BTreeMap, HashMap};

use super::types::ErrorCategory;

/// Failure counts keyed by category.
///
/// Not synchronized on its own: the limiter keeps it behind the same lock as
/// the success/error counters so the totals always agree.
#[derive(Debug, Default, Clone)]
pub(crate) struct ErrorStats {
    counts: HashMap<ErrorCategory, u64>,
}

impl ErrorStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for a category.
    pub(crate) fn record(&mut self, category: ErrorCategory) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    /// Counts keyed by stable label, in deterministic order.
    pub(crate) fn by_label(&self) -> BTreeMap<String, u64> {
        self.counts
            .iter()
            .map(|(category, count)| (category.label(), *count))
            .collect()
    }
}
