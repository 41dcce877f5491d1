//! Conversion and reconciliation runs behind the command line.
//!
//! Both runs share the usage ledger kept in the log directory:
//! 1. **Load**: read `slf_usage.json` (missing file means an empty ledger)
//! 2. **Convert**: build the dataset, skipping subjects already recorded
//! 3. **Write**: persist subject folders and per-series error counts
//! 4. **Record**: add converted subject ids and save the ledger atomically

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{error, info, info_span};

use psg_core::{ConversionContext, LEDGER_FILE_NAME, UsageLedger, convert_dataset};
use psg_edf::EdfDecoder;
use psg_report::{WriteOptions, write_dataset};
use psg_sync::{LocalDirStore, YearSync};

use crate::types::{ConvertResult, SeriesSummary, SyncResult, YearFailure};

/// Options of a local conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Folder holding one sub-folder per series.
    pub input_dir: PathBuf,
    pub dataset: String,
    pub series: Vec<String>,
    pub output_dir: PathBuf,
    /// Folder of the usage ledger.
    pub log_dir: PathBuf,
    pub reconvert: bool,
    pub sample_data: bool,
    /// Convert without writing the dataset or the ledger.
    pub dry_run: bool,
}

/// Options of an archive reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Mount point of the archive; years are folders below it.
    pub remote_root: PathBuf,
    pub years: Vec<String>,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub reconvert: bool,
    pub sample_data: bool,
}

pub fn ledger_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LEDGER_FILE_NAME)
}

fn load_context(log_dir: &Path, reconvert: bool) -> Result<(PathBuf, ConversionContext)> {
    let path = ledger_path(log_dir);
    let ledger = UsageLedger::load(&path)
        .with_context(|| format!("load usage ledger {}", path.display()))?;
    info!(path = %path.display(), entries = ledger.len(), "loaded usage ledger");
    Ok((path, ConversionContext::new(ledger).with_reconvert(reconvert)))
}

pub fn run_convert(options: &ConvertOptions, decoder: &dyn EdfDecoder) -> Result<ConvertResult> {
    let span = info_span!("convert", dataset = %options.dataset);
    let _guard = span.enter();
    let start = Instant::now();

    let (ledger_path, mut ctx) = load_context(&options.log_dir, options.reconvert)?;
    let dataset = convert_dataset(
        &options.input_dir,
        &options.dataset,
        &options.series,
        decoder,
        &mut ctx,
    )
    .with_context(|| format!("convert {}", options.input_dir.display()))?;

    let series: Vec<SeriesSummary> = dataset
        .series
        .values()
        .map(SeriesSummary::from_series)
        .collect();

    if options.dry_run {
        info!(
            subjects = dataset.subject_count(),
            duration_ms = start.elapsed().as_millis(),
            "dry run complete"
        );
        return Ok(ConvertResult {
            dataset: options.dataset.clone(),
            output_dir: None,
            series,
            ledger_path,
            new_ledger_entries: 0,
        });
    }

    let write_options = WriteOptions {
        sample_data: options.sample_data,
    };
    let written = write_dataset(&dataset, &options.output_dir, write_options)
        .with_context(|| format!("write dataset to {}", options.output_dir.display()))?;
    let new_ledger_entries: usize = dataset
        .series
        .values()
        .map(|series| ctx.mark_converted(series))
        .sum();
    ctx.ledger
        .save(&ledger_path)
        .with_context(|| format!("save usage ledger {}", ledger_path.display()))?;

    info!(
        subjects = written.subjects,
        sample_arrays = written.sample_arrays,
        new_ledger_entries,
        duration_ms = start.elapsed().as_millis(),
        "conversion complete"
    );
    Ok(ConvertResult {
        dataset: options.dataset.clone(),
        output_dir: Some(options.output_dir.join(&options.dataset)),
        series,
        ledger_path,
        new_ledger_entries,
    })
}

/// Reconciles each year in turn. A failed year is logged and reported; the
/// remaining years still run and the ledger is saved once at the end.
pub fn run_sync(options: &SyncOptions, decoder: &dyn EdfDecoder) -> Result<SyncResult> {
    let span = info_span!("sync", remote_root = %options.remote_root.display());
    let _guard = span.enter();

    if !options.remote_root.is_dir() {
        bail!("archive root {} is not a directory", options.remote_root.display());
    }
    let (ledger_path, mut ctx) = load_context(&options.log_dir, options.reconvert)?;
    let store = LocalDirStore::new(&options.remote_root);
    let write_options = WriteOptions {
        sample_data: options.sample_data,
    };

    let mut result = SyncResult {
        ledger_path,
        ..SyncResult::default()
    };
    for year in &options.years {
        let sync = YearSync::new(&store, decoder, "", year, &options.output_dir)
            .with_options(write_options);
        match sync.run(&mut ctx) {
            Ok(report) => result.years.push(report),
            Err(err) => {
                error!(year = %year, error = %err, "year failed");
                result.failures.push(YearFailure {
                    year: year.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    ctx.ledger
        .save(&result.ledger_path)
        .with_context(|| format!("save usage ledger {}", result.ledger_path.display()))?;
    Ok(result)
}
