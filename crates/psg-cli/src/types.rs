use std::path::PathBuf;

use serde::Serialize;

use psg_core::Series;
use psg_model::ErrorCounts;
use psg_sync::YearReport;

/// Result of converting local series folders.
#[derive(Debug, Serialize)]
pub struct ConvertResult {
    pub dataset: String,
    /// Dataset root; `None` on a dry run.
    pub output_dir: Option<PathBuf>,
    pub series: Vec<SeriesSummary>,
    pub ledger_path: PathBuf,
    /// Subject ids added to the usage ledger by this run.
    pub new_ledger_entries: usize,
}

impl ConvertResult {
    pub fn total_subjects(&self) -> usize {
        self.series.iter().map(|series| series.subjects).sum()
    }

    pub fn total_errors(&self) -> ErrorCounts {
        let mut total = ErrorCounts::default();
        for series in &self.series {
            total.edf_does_not_exist += series.error_counts.edf_does_not_exist;
            total.edf_reader_not_working += series.error_counts.edf_reader_not_working;
            total.annot_parse_error += series.error_counts.annot_parse_error;
        }
        total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub name: String,
    pub subjects: usize,
    pub annotated: usize,
    pub sample_arrays: usize,
    pub error_counts: ErrorCounts,
}

impl SeriesSummary {
    pub fn from_series(series: &Series) -> Self {
        Self {
            name: series.name.clone(),
            subjects: series.len(),
            annotated: series
                .subjects
                .values()
                .filter(|subject| subject.annotations.is_some())
                .count(),
            sample_arrays: series
                .subjects
                .values()
                .map(|subject| subject.sample_arrays.len())
                .sum(),
            error_counts: series.error_counts,
        }
    }
}

/// Result of reconciling archive years.
#[derive(Debug, Default)]
pub struct SyncResult {
    pub years: Vec<YearReport>,
    pub failures: Vec<YearFailure>,
    pub ledger_path: PathBuf,
}

impl SyncResult {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// A year that could not be listed or converted.
#[derive(Debug)]
pub struct YearFailure {
    pub year: String,
    pub error: String,
}
