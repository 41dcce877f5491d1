//! Series conversion over a synthetic study folder.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use psg_core::{ConversionContext, Series, UsageLedger, convert_dataset, read_series};
use psg_edf::EdfFileDecoder;
use psg_edf::testing::EdfFixture;
use psg_model::{AasmEvent, RecordingDevice, SleepStage};

const SERIES: &str = "2024";

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn remlogic_export(rows: &[&str]) -> Vec<u8> {
    let mut lines = vec![
        "RemLogic 3.4 export",
        "Patient: anonymised",
        "Scoreur: manual",
        "Date d'enregistrement: 01/01/2024",
        "",
        "Stade de sommeil\tPosition\tHeure [hh:mm:ss]\tEvenement\tDuree[s]",
    ];
    lines.extend_from_slice(rows);
    lines.join("\n").into_bytes()
}

const ROWS: &[&str] = &[
    "SLEEP-S0\tSupine\t22:00:00\tSLEEP-S0\t30",
    "SLEEP-S0\tSupine\t22:00:30\tSLEEP-S1\t30",
    "SLEEP-S1\tSupine\t23:00:00\tAPNEA-OBSTRUCTIVE\t12",
];

fn edf(path: &Path, start: NaiveDateTime) {
    EdfFixture::new(start)
        .signal("EEG C3/A2", 2, vec![0, 10, 20, 30])
        .signal("SpO2.", 1, vec![5, 6])
        .write(path)
        .unwrap();
}

/// A series with one converted subject and one of each failure.
fn study() -> TempDir {
    let root = TempDir::new().unwrap();
    let series = root.path().join(SERIES);
    for patient in ["PA0042", "PA0043", "PA0044", "PA0045"] {
        fs::create_dir_all(series.join(patient)).unwrap();
    }
    fs::write(series.join("README.md"), b"not a patient").unwrap();

    let pa42 = series.join("PA0042");
    edf(&pa42.join("FE0012T1-PA0042V1C1.edf"), at(1, 22, 0, 0));
    fs::write(pa42.join("FE0012T1-PA0042V1C1.txt"), remlogic_export(ROWS)).unwrap();

    fs::write(series.join("PA0043").join("notes.txt"), b"no recording").unwrap();

    let pa44 = series.join("PA0044");
    fs::write(pa44.join("FE0001T1-PA0044V1C1.edf"), b"truncated").unwrap();
    edf(&pa44.join("FE0002T2-PA0044V1C1.edf"), at(1, 9, 0, 0));

    let pa45 = series.join("PA0045");
    edf(&pa45.join("FE0003T1-PA0045V1C1.EDF"), at(1, 22, 0, 0));
    fs::write(
        pa45.join("FE0003T1-PA0045V1C1.txt"),
        remlogic_export(&["SLEEP-S0\tSupine\t22:61:00\tSLEEP-S0\t30"]),
    )
    .unwrap();

    root
}

fn convert(root: &TempDir, ctx: &mut ConversionContext) -> Series {
    read_series(&root.path().join(SERIES), SERIES, &EdfFileDecoder, ctx).unwrap()
}

#[test]
fn series_conversion_tallies_failures() {
    let root = study();
    let mut ctx = ConversionContext::default();
    let series = convert(&root, &mut ctx);

    let ids: Vec<&str> = series.subjects.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["PA0042_V1_FE0012", "PA0045_V1_FE0003"]);

    assert_eq!(series.error_counts.edf_does_not_exist, 1);
    assert_eq!(series.error_counts.edf_reader_not_working, 1);
    assert_eq!(series.error_counts.annot_parse_error, 1);
    assert_eq!(ctx.error_counts(SERIES), series.error_counts);
}

#[test]
fn converted_subject_carries_signals_and_classified_streams() {
    let root = study();
    let mut ctx = ConversionContext::default();
    let series = convert(&root, &mut ctx);
    let subject = &series.subjects["PA0042_V1_FE0012"];

    assert_eq!(subject.metadata.recording_device, RecordingDevice::RemLogic);
    assert_eq!(subject.metadata.recording_start_ts, at(1, 22, 0, 0));
    assert_eq!(subject.metadata.analysis_start, Some(at(1, 22, 0, 0)));
    assert_eq!(subject.metadata.analysis_end, Some(at(1, 23, 0, 12)));
    assert_eq!(subject.metadata.lights_off, None);

    let channels: Vec<&str> = subject.sample_arrays.keys().map(String::as_str).collect();
    assert_eq!(channels, vec!["EEG C3_A2", "SpO2"]);
    let eeg = &subject.sample_arrays["EEG C3_A2"];
    assert_eq!(eeg.attributes.sampling_rate, 2.0);
    assert_eq!(eeg.attributes.unit, "uV");
    assert_eq!(eeg.load().unwrap().len(), 4);

    let annotations = subject.annotations.as_ref().unwrap();
    assert_eq!(annotations.original.len(), 3);
    let stages: Vec<SleepStage> = annotations
        .hypnogram
        .annotations
        .iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(stages, vec![SleepStage::W, SleepStage::N1]);
    let events: Vec<(AasmEvent, f64)> = annotations
        .events
        .annotations
        .iter()
        .map(|a| (a.name, a.start_sec))
        .collect();
    assert_eq!(events, vec![(AasmEvent::ApneaObstructive, 3600.0)]);
}

#[test]
fn annotation_failure_keeps_the_subject_without_annotations() {
    let root = study();
    let mut ctx = ConversionContext::default();
    let series = convert(&root, &mut ctx);
    let subject = &series.subjects["PA0045_V1_FE0003"];

    assert!(subject.annotations.is_none());
    assert_eq!(subject.metadata.recording_device, RecordingDevice::Unknown);
    assert_eq!(subject.metadata.analysis_start, None);
    assert_eq!(subject.sample_arrays.len(), 2);
}

#[test]
fn ledger_makes_conversion_idempotent() {
    let root = study();
    let mut ctx = ConversionContext::new(UsageLedger::default());
    let first = convert(&root, &mut ctx);
    assert_eq!(ctx.mark_converted(&first), 2);
    assert_eq!(ctx.mark_converted(&first), 0);

    let mut again = ConversionContext::new(ctx.ledger.clone());
    let second = convert(&root, &mut again);
    assert!(second.is_empty());

    let mut forced = ConversionContext::new(ctx.ledger.clone()).with_reconvert(true);
    let third = convert(&root, &mut forced);
    assert_eq!(third.len(), 2);
}

#[test]
fn annotations_are_found_under_the_first_name_token() {
    let root = TempDir::new().unwrap();
    let patient = root.path().join(SERIES).join("PA0046");
    fs::create_dir_all(&patient).unwrap();
    edf(&patient.join("FE0004T1-PA0046V1C1 night.edf"), at(1, 21, 59, 30));
    fs::write(patient.join("FE0004T1-PA0046V1C1.txt"), remlogic_export(ROWS)).unwrap();

    let mut ctx = ConversionContext::default();
    let dataset = convert_dataset(
        root.path(),
        "slf_to_compute",
        &[SERIES.to_string()],
        &EdfFileDecoder,
        &mut ctx,
    )
    .unwrap();

    assert_eq!(dataset.name, "slf_to_compute");
    assert_eq!(dataset.subject_count(), 1);
    let subject = &dataset.series[SERIES].subjects["PA0046_V1_FE0004"];
    let offsets: Vec<f64> = subject
        .annotations
        .as_ref()
        .unwrap()
        .original
        .annotations
        .iter()
        .map(|a| a.start_sec)
        .collect();
    assert_eq!(offsets, vec![30.0, 60.0, 3630.0]);
}
