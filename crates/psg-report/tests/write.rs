//! Dataset writing from a converted synthetic series.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tempfile::TempDir;

use psg_core::{ConversionContext, Dataset, read_series};
use psg_edf::EdfFileDecoder;
use psg_edf::testing::EdfFixture;
use psg_report::{WriteOptions, read_error_counts, write_dataset};

fn remlogic_export() -> Vec<u8> {
    [
        "RemLogic 3.4 export",
        "Patient: anonymised",
        "Scoreur: manual",
        "Date d'enregistrement: 01/01/2024",
        "",
        "Stade de sommeil\tPosition\tHeure [hh:mm:ss]\tEvénement\tDurée[s]",
        "SLEEP-S0\tSupine\t22:00:00\tSLEEP-S0\t30",
        "SLEEP-S0\tSupine\t22:00:30\tSLEEP-S1\t30",
        "SLEEP-S1\tSupine\t23:00:00\tAPNEA-OBSTRUCTIVE\t12",
    ]
    .join("\n")
    .chars()
    .map(|c| u8::try_from(u32::from(c)).unwrap())
    .collect()
}

fn converted_dataset(input: &Path) -> Dataset {
    let series_dir = input.join("2024");
    let annotated = series_dir.join("PA0042");
    let bare = series_dir.join("PA0050");
    let empty = series_dir.join("PA0051");
    for dir in [&annotated, &bare, &empty] {
        fs::create_dir_all(dir).unwrap();
    }

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap();
    let fixture = EdfFixture::new(start)
        .signal("EEG C3/A2", 2, vec![0, 10, 20, 30])
        .signal("Position", 1, vec![1, 1]);
    fixture
        .write(&annotated.join("FE0012T1-PA0042V1C1.edf"))
        .unwrap();
    fs::write(annotated.join("FE0012T1-PA0042V1C1.txt"), remlogic_export()).unwrap();
    fixture.write(&bare.join("FE0020T1-PA0050V2C1.edf")).unwrap();

    let mut ctx = ConversionContext::default();
    let series = read_series(&series_dir, "2024", &EdfFileDecoder, &mut ctx).unwrap();
    let mut dataset = Dataset::new("slf_to_compute");
    dataset.series.insert(series.name.clone(), series);
    dataset
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn writes_subject_folders() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dataset = converted_dataset(input.path());

    let summary = write_dataset(&dataset, out.path(), WriteOptions::default()).unwrap();
    assert_eq!(summary.subjects, 2);
    assert_eq!(summary.annotated_subjects, 1);
    assert_eq!(summary.sample_arrays, 4);

    let subject_dir = out.path().join("slf_to_compute/2024/PA0042_V1_FE0012");
    insta::assert_json_snapshot!(read_json(&subject_dir.join("metadata.json")), @r#"
    {
      "additional_info": {
        "recording_device": "RemLogic"
      },
      "analysis_end": "2024-01-01T23:00:12",
      "analysis_start": "2024-01-01T22:00:00",
      "lights_off": null,
      "lights_on": null,
      "recording_start_ts": "2024-01-01T22:00:00",
      "subject_id": "PA0042_V1_FE0012"
    }
    "#);

    let hypnogram = read_json(&subject_dir.join("manual_hypnogram.json"));
    assert_eq!(hypnogram["scorer"], "manual");
    assert_eq!(hypnogram["annotations"][0]["name"], "W");
    assert_eq!(hypnogram["annotations"][1]["name"], "N1");
    assert_eq!(hypnogram["annotations"][1]["start_sec"], 30.0);

    let events = read_json(&subject_dir.join("manual_aasmevents.json"));
    assert_eq!(events["annotations"][0]["name"], "APNEA_OBSTRUCTIVE");

    let original = read_json(&subject_dir.join("original_annotations.json"));
    assert_eq!(original["scorer"], "original");
    assert_eq!(original["annotations"].as_array().unwrap().len(), 3);

    let eeg_dir = subject_dir.join("sample_arrays/EEG C3_A2");
    let attributes = read_json(&eeg_dir.join("attributes.json"));
    assert_eq!(attributes["name"], "EEG C3_A2");
    assert_eq!(attributes["sampling_rate"], 2.0);
    assert_eq!(attributes["start_ts"], "2024-01-01T22:00:00");
    assert_eq!(fs::read(eeg_dir.join("data.f32")).unwrap().len(), 4 * 4);
}

#[test]
fn subject_without_annotations_has_no_annotation_files() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dataset = converted_dataset(input.path());

    write_dataset(
        &dataset,
        out.path(),
        WriteOptions { sample_data: false },
    )
    .unwrap();

    let subject_dir = out.path().join("slf_to_compute/2024/PA0050_V2_FE0020");
    assert!(subject_dir.join("metadata.json").is_file());
    assert!(!subject_dir.join("manual_hypnogram.json").exists());
    assert!(!subject_dir.join("original_annotations.json").exists());
    assert_eq!(
        read_json(&subject_dir.join("metadata.json"))["additional_info"]["recording_device"],
        "Unknown"
    );
    assert!(
        subject_dir
            .join("sample_arrays/Position/attributes.json")
            .is_file()
    );
    assert!(!subject_dir.join("sample_arrays/Position/data.f32").exists());
}

#[test]
fn error_counts_are_keyed_by_series() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let dataset = converted_dataset(input.path());

    write_dataset(&dataset, out.path(), WriteOptions::default()).unwrap();

    let counts = read_error_counts(&out.path().join("conversion_error_counts.json")).unwrap();
    assert_eq!(counts["2024"].edf_does_not_exist, 1);
    assert_eq!(counts["2024"].total(), 1);

    let raw = read_json(&out.path().join("conversion_error_counts.json"));
    assert_eq!(raw["2024"]["EDF_does_not_exist"], 1);
}
