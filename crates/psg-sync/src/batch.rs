//! One year of remote reconciliation: download the recordings that have no
//! converted folder yet, convert them, and upload the new subject folders.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use psg_core::{ConversionContext, RecordingName, convert_dataset};
use psg_edf::EdfDecoder;
use psg_report::{WriteOptions, write_dataset};

use crate::error::{Result, SyncError};
use crate::inventory::{PatientStatus, SLF_FOLDER_PREFIX, check_patient_recordings};
use crate::store::{RemoteStore, create_dir, join_remote};

/// Dataset name under which new conversions are written.
pub const STAGING_DATASET: &str = "slf_to_compute";

/// Raw file extensions fetched for conversion.
pub const RAW_EXTENSIONS: &[&str] = &[".edf", ".txt", ".rtf", ".csv"];

const PRIMARY_PSG_MARKER: &str = "T1-";

/// Outcome of one year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearReport {
    pub year: String,
    /// Patients whose missing recordings were downloaded.
    pub downloaded_patients: usize,
    /// Subjects converted in this run.
    pub converted_subjects: usize,
    /// Subject folders uploaded to the archive.
    pub uploaded: Vec<String>,
    /// Patients skipped after a remote or consistency failure.
    pub skipped_patients: Vec<String>,
}

/// Reconciles one year folder of the archive with the local output root.
pub struct YearSync<'a> {
    store: &'a dyn RemoteStore,
    decoder: &'a dyn EdfDecoder,
    remote_year_dir: String,
    year: String,
    slf_output: PathBuf,
    options: WriteOptions,
}

impl<'a> YearSync<'a> {
    pub fn new(
        store: &'a dyn RemoteStore,
        decoder: &'a dyn EdfDecoder,
        remote_root: &str,
        year: &str,
        slf_output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            decoder,
            remote_year_dir: join_remote(remote_root, year),
            year: year.to_string(),
            slf_output: slf_output.into(),
            options: WriteOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Local folder holding the converted subjects of this year.
    pub fn local_year_dir(&self) -> PathBuf {
        self.slf_output.join(STAGING_DATASET).join(&self.year)
    }

    /// Runs download, conversion and upload for the year.
    ///
    /// Fails only when the year folder cannot be listed or the staged series
    /// cannot be converted or written; patient-level failures are logged and
    /// reported as skipped.
    pub fn run(&self, ctx: &mut ConversionContext) -> Result<YearReport> {
        let year_span = info_span!("year", year = %self.year);
        let _year_guard = year_span.enter();

        let patients = self.store.list(&self.remote_year_dir)?;
        info!(patients = patients.len(), "listed remote year");

        let mut report = YearReport {
            year: self.year.clone(),
            ..YearReport::default()
        };
        self.convert_missing(&patients, ctx, &mut report)?;
        self.upload_new(&mut report)?;
        Ok(report)
    }

    fn convert_missing(
        &self,
        patients: &[String],
        ctx: &mut ConversionContext,
        report: &mut YearReport,
    ) -> Result<()> {
        let staging = tempfile::tempdir().map_err(|source| SyncError::Io {
            operation: "create staging directory",
            path: std::env::temp_dir(),
            source,
        })?;
        let staged_year = staging.path().join(&self.year);
        create_dir(&staged_year)?;

        for patient in patients {
            match self.stage_patient(patient, &staged_year) {
                Ok(true) => report.downloaded_patients += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(patient = %patient, error = %err, "skipping patient");
                    report.skipped_patients.push(patient.clone());
                }
            }
        }
        if report.downloaded_patients == 0 {
            info!("nothing to convert");
            return Ok(());
        }

        info!(
            patients = report.downloaded_patients,
            "converting staged recordings"
        );
        let dataset = convert_dataset(
            staging.path(),
            STAGING_DATASET,
            std::slice::from_ref(&self.year),
            self.decoder,
            ctx,
        )?;
        write_dataset(&dataset, &self.slf_output, self.options)?;
        for series in dataset.series.values() {
            report.converted_subjects += series.len();
            ctx.mark_converted(series);
        }
        Ok(())
    }

    /// Downloads the raw files of a patient's unconverted recordings.
    /// Returns whether anything was staged.
    fn stage_patient(&self, patient: &str, staged_year: &Path) -> Result<bool> {
        let remote_patient = join_remote(&self.remote_year_dir, patient);
        let files = self.store.list(&remote_patient)?;
        let status = check_patient_recordings(&files);
        if !status.has_valid_psg {
            warn!(patient, "no valid T1 PSG found");
            return Ok(false);
        }
        if status.all_converted {
            info!(patient, "all recordings already converted");
            return Ok(false);
        }
        info!(patient, missing = %format_missing(&status), "recordings to convert");

        let wanted: Vec<&String> = files
            .iter()
            .filter(|file| is_raw_file(file))
            .filter(|file| status.missing.iter().any(|key| key.matches_file(file)))
            .collect();
        if wanted.is_empty() {
            warn!(patient, "no T1 files to download");
            return Ok(false);
        }

        let local_patient = staged_year.join(patient);
        for file in wanted {
            self.store
                .download(&join_remote(&remote_patient, file), &local_patient.join(file))?;
        }
        lowercase_extensions(&local_patient)?;
        Ok(true)
    }

    fn upload_new(&self, report: &mut YearReport) -> Result<()> {
        let local_year = self.local_year_dir();
        if !local_year.is_dir() {
            warn!(path = %local_year.display(), "local year directory not found");
            return Ok(());
        }

        for patient in local_patients(&local_year)? {
            match self.upload_patient(&patient, &local_year) {
                Ok(uploaded) => report.uploaded.extend(uploaded),
                Err(err) => {
                    warn!(patient = %patient, error = %err, "skipping upload");
                    report.skipped_patients.push(patient);
                }
            }
        }
        Ok(())
    }

    fn upload_patient(&self, patient: &str, local_year: &Path) -> Result<Vec<String>> {
        let remote_patient = join_remote(&self.remote_year_dir, patient);
        let files = self.store.list(&remote_patient)?;
        let status = check_patient_recordings(&files);
        if status.all_converted {
            info!(patient, "all converted folders already uploaded");
            return Ok(Vec::new());
        }

        let expected = patient.trim_start_matches("PA");
        if let Some(edf) = files
            .iter()
            .filter(|file| file.to_lowercase().ends_with(".edf"))
            .find(|file| {
                let found = RecordingName::parse(file).patient;
                !found.is_empty() && found != expected
            })
        {
            warn!(patient, edf = %edf, "inconsistent patient id, not uploading");
            return Ok(Vec::new());
        }

        let mut uploaded = Vec::new();
        for key in &status.missing {
            let subject_id = format!("{patient}_{}", key.suffix());
            let local_subject = local_year.join(&subject_id);
            if !local_subject.is_dir() {
                warn!(patient, subject_id = %subject_id, "missing local folder");
                continue;
            }
            let remote_subject =
                join_remote(&remote_patient, &format!("{SLF_FOLDER_PREFIX}{subject_id}"));
            info!(subject_id = %subject_id, remote = %remote_subject, "uploading");
            self.store.upload_tree(&local_subject, &remote_subject)?;
            uploaded.push(subject_id);
        }
        Ok(uploaded)
    }
}

fn is_raw_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    RAW_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) && name.contains(PRIMARY_PSG_MARKER)
}

fn format_missing(status: &PatientStatus) -> String {
    status
        .missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Patient ids of the converted subject folders in `local_year`.
fn local_patients(local_year: &Path) -> Result<BTreeSet<String>> {
    let io_error = |source: std::io::Error| SyncError::Io {
        operation: "list",
        path: local_year.to_path_buf(),
        source,
    };
    let mut patients = BTreeSet::new();
    for entry in fs::read_dir(local_year).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(patient) = name.split('_').next() {
            patients.insert(patient.to_string());
        }
    }
    Ok(patients)
}

/// Renames files in `dir` so their extension is lowercase.
pub fn lowercase_extensions(dir: &Path) -> Result<()> {
    let io_error = |operation: &'static str, path: &Path, source: std::io::Error| SyncError::Io {
        operation,
        path: path.to_path_buf(),
        source,
    };
    let entries = fs::read_dir(dir).map_err(|e| io_error("list", dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| io_error("list", dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().map(|ext| ext.to_string_lossy().into_owned()) else {
            continue;
        };
        let lower = ext.to_lowercase();
        if lower != ext {
            let target = path.with_extension(&lower);
            fs::rename(&path, &target).map_err(|e| io_error("rename", &path, e))?;
        }
    }
    Ok(())
}
