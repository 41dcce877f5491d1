//! Year reconciliation against an archive on the local filesystem.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use psg_core::ConversionContext;
use psg_edf::EdfFileDecoder;
use psg_edf::testing::EdfFixture;
use psg_report::WriteOptions;
use psg_sync::{LocalDirStore, SyncError, YearSync};

fn remlogic_export() -> Vec<u8> {
    [
        "RemLogic 3.4 export",
        "Patient: anonymised",
        "Scoreur: manual",
        "Date d'enregistrement: 01/01/2024",
        "",
        "Stade de sommeil\tPosition\tHeure [hh:mm:ss]\tEvenement\tDuree[s]",
        "SLEEP-S0\tSupine\t22:00:00\tSLEEP-S0\t30",
        "SLEEP-S2\tSupine\t22:00:30\tSLEEP-S2\t30",
    ]
    .join("\n")
    .into_bytes()
}

fn write_edf(path: &Path) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap();
    EdfFixture::new(start)
        .signal("EEG C3-A2", 2, vec![0, 1, 2, 3])
        .write(path)
        .unwrap();
}

/// Archive with one patient to convert, one already converted and one
/// without a primary PSG.
fn archive() -> TempDir {
    let root = TempDir::new().unwrap();
    let year = root.path().join("2024");

    let pa42 = year.join("PA0042");
    fs::create_dir_all(&pa42).unwrap();
    write_edf(&pa42.join("FE0012T1-PA0042V1C1.EDF"));
    fs::write(pa42.join("FE0012T1-PA0042V1C1.txt"), remlogic_export()).unwrap();
    write_edf(&pa42.join("FE0013T2-PA0042V1C1.edf"));

    let pa43 = year.join("PA0043");
    fs::create_dir_all(pa43.join("slf_PA0043_V1_FE0001")).unwrap();
    write_edf(&pa43.join("FE0001T1-PA0043V1C1.edf"));

    let pa44 = year.join("PA0044");
    fs::create_dir_all(&pa44).unwrap();
    fs::write(pa44.join("notes.txt"), b"MSLT only").unwrap();

    root
}

fn options() -> WriteOptions {
    WriteOptions { sample_data: false }
}

#[test]
fn missing_recordings_are_converted_and_uploaded() {
    let remote = archive();
    let output = TempDir::new().unwrap();
    let store = LocalDirStore::new(remote.path());
    let decoder = EdfFileDecoder;
    let sync = YearSync::new(&store, &decoder, "", "2024", output.path()).with_options(options());

    let mut ctx = ConversionContext::default();
    let report = sync.run(&mut ctx).unwrap();

    assert_eq!(report.downloaded_patients, 1);
    assert_eq!(report.converted_subjects, 1);
    assert_eq!(report.uploaded, vec!["PA0042_V1_FE0012"]);
    assert!(report.skipped_patients.is_empty());
    assert!(ctx.ledger.contains("PA0042_V1_FE0012"));

    let uploaded = remote.path().join("2024/PA0042/slf_PA0042_V1_FE0012");
    assert!(uploaded.join("metadata.json").is_file());
    assert!(uploaded.join("manual_hypnogram.json").is_file());
    assert!(
        output
            .path()
            .join("slf_to_compute/2024/PA0042_V1_FE0012/metadata.json")
            .is_file()
    );
    assert!(output.path().join("conversion_error_counts.json").is_file());

    let again = sync.run(&mut ctx).unwrap();
    assert_eq!(again.downloaded_patients, 0);
    assert!(again.uploaded.is_empty());
}

#[test]
fn inconsistent_patient_folder_is_not_uploaded() {
    let remote = TempDir::new().unwrap();
    let patient = remote.path().join("2024/PA0050");
    fs::create_dir_all(&patient).unwrap();
    write_edf(&patient.join("FE0001T1-PA0050V1C1.edf"));
    write_edf(&patient.join("FE0002T1-PA0051V1C1.edf"));

    let output = TempDir::new().unwrap();
    let store = LocalDirStore::new(remote.path());
    let decoder = EdfFileDecoder;
    let sync = YearSync::new(&store, &decoder, "", "2024", output.path()).with_options(options());

    let mut ctx = ConversionContext::default();
    let report = sync.run(&mut ctx).unwrap();

    assert_eq!(report.converted_subjects, 2);
    assert!(report.uploaded.is_empty());
    assert_eq!(report.skipped_patients, vec!["PA0051"]);
    assert!(!patient.join("slf_PA0050_V1_FE0001").exists());
}

#[test]
fn unlisted_year_is_an_error() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let store = LocalDirStore::new(remote.path());
    let decoder = EdfFileDecoder;
    let sync = YearSync::new(&store, &decoder, "", "1999", output.path());

    let err = sync.run(&mut ConversionContext::default()).unwrap_err();
    assert!(matches!(err, SyncError::Remote { operation: "list", .. }));
}
