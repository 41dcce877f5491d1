//! Synthetic EDF files for tests.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::header::{ANNOTATION_LABEL, HEADER_BLOCK_BYTES};

#[derive(Debug, Clone)]
struct FixtureSignal {
    label: String,
    dimension: String,
    physical: (f64, f64),
    digital: (i64, i64),
    samples_per_record: usize,
    samples: Vec<i16>,
}

/// Builder for a small, valid EDF(+) file.
#[derive(Debug, Clone)]
pub struct EdfFixture {
    start: NaiveDateTime,
    record_duration: f64,
    signals: Vec<FixtureSignal>,
    annotations: Vec<(f64, Option<f64>, String)>,
}

impl EdfFixture {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            record_duration: 1.0,
            signals: Vec::new(),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn record_duration(mut self, seconds: f64) -> Self {
        self.record_duration = seconds;
        self
    }

    /// Adds a signal with physical range -100..100 over digital -2048..2047.
    #[must_use]
    pub fn signal(mut self, label: &str, samples_per_record: usize, samples: Vec<i16>) -> Self {
        self.signals.push(FixtureSignal {
            label: label.to_string(),
            dimension: "uV".to_string(),
            physical: (-100.0, 100.0),
            digital: (-2048, 2047),
            samples_per_record,
            samples,
        });
        self
    }

    /// Adds an EDF+ annotation; the file gets an annotation channel.
    #[must_use]
    pub fn annotation(mut self, onset: f64, duration: Option<f64>, label: &str) -> Self {
        self.annotations.push((onset, duration, label.to_string()));
        self
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let records = self
            .signals
            .iter()
            .map(|s| s.samples.len().div_ceil(s.samples_per_record.max(1)))
            .max()
            .unwrap_or(0)
            .max(1);
        let tal_records = self.tal_records(records);
        let annotation_samples = if self.annotations.is_empty() {
            0
        } else {
            tal_records.iter().map(Vec::len).max().unwrap_or(0).div_ceil(2)
        };

        let mut columns: Vec<(String, String, (f64, f64), (i64, i64), usize)> = self
            .signals
            .iter()
            .map(|s| {
                (
                    s.label.clone(),
                    s.dimension.clone(),
                    s.physical,
                    s.digital,
                    s.samples_per_record,
                )
            })
            .collect();
        if annotation_samples > 0 {
            columns.push((
                ANNOTATION_LABEL.to_string(),
                String::new(),
                (-1.0, 1.0),
                (-32768, 32767),
                annotation_samples,
            ));
        }

        let count = columns.len();
        let mut out = Vec::new();
        push_field(&mut out, "0", 8);
        push_field(&mut out, "X X X X", 80);
        push_field(&mut out, "Startdate X X X X", 80);
        push_field(&mut out, &self.start.format("%d.%m.%y").to_string(), 8);
        push_field(&mut out, &self.start.format("%H.%M.%S").to_string(), 8);
        push_field(&mut out, &(HEADER_BLOCK_BYTES * (count + 1)).to_string(), 8);
        let reserved = if annotation_samples > 0 { "EDF+C" } else { "" };
        push_field(&mut out, reserved, 44);
        push_field(&mut out, &records.to_string(), 8);
        push_field(&mut out, &self.record_duration.to_string(), 8);
        push_field(&mut out, &count.to_string(), 4);

        for column in &columns {
            push_field(&mut out, &column.0, 16);
        }
        for _ in &columns {
            push_field(&mut out, "", 80);
        }
        for column in &columns {
            push_field(&mut out, &column.1, 8);
        }
        for column in &columns {
            push_field(&mut out, &column.2.0.to_string(), 8);
        }
        for column in &columns {
            push_field(&mut out, &column.2.1.to_string(), 8);
        }
        for column in &columns {
            push_field(&mut out, &column.3.0.to_string(), 8);
        }
        for column in &columns {
            push_field(&mut out, &column.3.1.to_string(), 8);
        }
        for _ in &columns {
            push_field(&mut out, "", 80);
        }
        for column in &columns {
            push_field(&mut out, &column.4.to_string(), 8);
        }
        for _ in &columns {
            push_field(&mut out, "", 32);
        }

        for (record, tal) in tal_records.iter().enumerate() {
            for signal in &self.signals {
                for i in 0..signal.samples_per_record {
                    let value = signal
                        .samples
                        .get(record * signal.samples_per_record + i)
                        .copied()
                        .unwrap_or(0);
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
            if annotation_samples > 0 {
                let mut block = tal.clone();
                block.resize(annotation_samples * 2, 0);
                out.extend_from_slice(&block);
            }
        }
        out
    }

    fn tal_records(&self, records: usize) -> Vec<Vec<u8>> {
        (0..records)
            .map(|record| {
                let mut tal = format!("+{}\x14\x14\0", record as f64 * self.record_duration)
                    .into_bytes();
                if record == 0 {
                    for (onset, duration, label) in &self.annotations {
                        let timing = match duration {
                            Some(duration) => format!("+{onset}\x15{duration}"),
                            None => format!("+{onset}"),
                        };
                        tal.extend_from_slice(format!("{timing}\x14{label}\x14\0").as_bytes());
                    }
                }
                tal
            })
            .collect()
    }
}

fn push_field(out: &mut Vec<u8>, value: &str, width: usize) {
    let mut bytes: Vec<u8> = value.bytes().take(width).collect();
    bytes.resize(width, b' ');
    out.extend_from_slice(&bytes);
}
