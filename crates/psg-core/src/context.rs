//! Shared state of one conversion batch.

use std::collections::BTreeMap;

use tracing::debug;

use psg_model::{ConversionFailure, ErrorCounts};

use crate::ledger::UsageLedger;
use crate::subject::Series;

/// Error tally and usage ledger threaded through a conversion batch.
///
/// The ledger is read once before the batch and saved once after it; the
/// tally only grows.
#[derive(Debug, Clone, Default)]
pub struct ConversionContext {
    pub ledger: UsageLedger,
    /// Convert recordings even when their subject id is already in the ledger.
    pub reconvert: bool,
    error_counts: BTreeMap<String, ErrorCounts>,
}

impl ConversionContext {
    pub fn new(ledger: UsageLedger) -> Self {
        Self {
            ledger,
            reconvert: false,
            error_counts: BTreeMap::new(),
        }
    }

    pub fn with_reconvert(mut self, reconvert: bool) -> Self {
        self.reconvert = reconvert;
        self
    }

    /// Whether `subject_id` should be skipped as already converted.
    pub fn is_converted(&self, subject_id: &str) -> bool {
        !self.reconvert && self.ledger.contains(subject_id)
    }

    pub fn record_failure(&mut self, series: &str, failure: ConversionFailure) {
        self.error_counts
            .entry(series.to_string())
            .or_default()
            .record(failure);
    }

    pub fn error_counts(&self, series: &str) -> ErrorCounts {
        self.error_counts.get(series).copied().unwrap_or_default()
    }

    pub fn all_error_counts(&self) -> &BTreeMap<String, ErrorCounts> {
        &self.error_counts
    }

    /// Adds every subject of `series` to the ledger. Returns how many were new.
    pub fn mark_converted(&mut self, series: &Series) -> usize {
        let added = series
            .subjects
            .keys()
            .filter(|id| self.ledger.record(id))
            .count();
        debug!(series = %series.name, added, "updated usage ledger");
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_tallied_per_series() {
        let mut ctx = ConversionContext::default();
        ctx.record_failure("2023", ConversionFailure::NoEdfFound);
        ctx.record_failure("2024", ConversionFailure::EdfDecodeFailed);
        ctx.record_failure("2024", ConversionFailure::EdfDecodeFailed);

        assert_eq!(ctx.error_counts("2023").edf_does_not_exist, 1);
        assert_eq!(ctx.error_counts("2024").edf_reader_not_working, 2);
        assert_eq!(ctx.error_counts("2025"), ErrorCounts::default());
        assert_eq!(ctx.all_error_counts().len(), 2);
    }

    #[test]
    fn reconvert_ignores_the_ledger() {
        let mut ledger = UsageLedger::default();
        ledger.record("PA1_V1_FE1");

        let ctx = ConversionContext::new(ledger.clone());
        assert!(ctx.is_converted("PA1_V1_FE1"));

        let ctx = ConversionContext::new(ledger).with_reconvert(true);
        assert!(!ctx.is_converted("PA1_V1_FE1"));
    }
}
