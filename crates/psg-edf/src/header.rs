//! Fixed-width EDF header parsing.
//!
//! Layout reference: <https://www.edfplus.info/specs/edf.html>. The main
//! header is 256 bytes; each signal adds 256 bytes stored field-major (all
//! labels first, then all transducers, ...).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{EdfError, Result};

/// Size of the main header and of each per-signal header block.
pub const HEADER_BLOCK_BYTES: usize = 256;

/// Label of the EDF+ annotation channel.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

/// Recording-level header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub version: String,
    pub patient: String,
    pub recording: String,
    /// Start of the recording, resolved from `dd.mm.yy` and `hh.mm.ss`.
    pub start: NaiveDateTime,
    pub header_bytes: usize,
    /// `EDF+C`, `EDF+D` or empty for plain EDF.
    pub reserved: String,
    /// Number of data records, `-1` when the writer did not finalize it.
    pub data_records: i64,
    /// Duration of one data record in seconds.
    pub record_duration: f64,
    pub signals: Vec<SignalHeader>,
}

impl EdfHeader {
    pub fn is_edf_plus(&self) -> bool {
        self.reserved.starts_with("EDF+")
    }

    pub fn is_discontinuous(&self) -> bool {
        self.reserved.starts_with("EDF+D")
    }

    /// Bytes per data record across all signals.
    pub fn record_bytes(&self) -> usize {
        self.signals
            .iter()
            .map(|signal| signal.samples_per_record * 2)
            .sum()
    }

    /// Byte offset of `signal` inside one data record.
    pub fn signal_offset(&self, signal: usize) -> usize {
        self.signals[..signal]
            .iter()
            .map(|s| s.samples_per_record * 2)
            .sum()
    }

    pub fn annotation_signal(&self) -> Option<usize> {
        self.signals.iter().position(SignalHeader::is_annotation)
    }
}

/// Per-signal header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalHeader {
    pub label: String,
    pub transducer: String,
    pub physical_dimension: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i64,
    pub digital_max: i64,
    pub prefilter: String,
    pub samples_per_record: usize,
}

impl SignalHeader {
    pub fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_LABEL
    }

    pub fn sample_frequency(&self, record_duration: f64) -> f64 {
        self.samples_per_record as f64 / record_duration
    }

    pub fn gain(&self) -> f64 {
        (self.physical_max - self.physical_min) / (self.digital_max - self.digital_min) as f64
    }

    pub fn offset(&self) -> f64 {
        self.physical_max - self.gain() * self.digital_max as f64
    }
}

/// Parses the 256-byte main header. Signal headers are left empty.
pub fn parse_main_header(block: &[u8]) -> Result<(EdfHeader, usize)> {
    if block.len() < HEADER_BLOCK_BYTES {
        return Err(EdfError::InvalidField {
            field: "header",
            value: format!("{} bytes", block.len()),
        });
    }
    let version = field(block, 0, 8);
    if version.parse::<u32>().is_err() {
        return Err(EdfError::UnsupportedVersion { version });
    }
    let date = field(block, 168, 8);
    let time = field(block, 176, 8);
    let start = parse_start(&date, &time)?;
    let header_bytes = parse_number::<usize>(block, 184, 8, "header bytes")?;
    let data_records = parse_number::<i64>(block, 236, 8, "data records")?;
    let record_duration = parse_number::<f64>(block, 244, 8, "record duration")?;
    let signal_count = parse_number::<usize>(block, 252, 4, "signal count")?;

    if signal_count == 0 {
        return Err(EdfError::InvalidSignalCount(signal_count));
    }
    let expected = HEADER_BLOCK_BYTES * (signal_count + 1);
    if header_bytes != expected {
        return Err(EdfError::HeaderSize {
            actual: header_bytes,
            expected,
            signals: signal_count,
        });
    }

    let header = EdfHeader {
        version,
        patient: field(block, 8, 80),
        recording: field(block, 88, 80),
        start,
        header_bytes,
        reserved: field(block, 192, 44),
        data_records,
        record_duration,
        signals: Vec::new(),
    };
    Ok((header, signal_count))
}

/// Parses `count` field-major signal headers.
pub fn parse_signal_headers(block: &[u8], count: usize) -> Result<Vec<SignalHeader>> {
    if block.len() < HEADER_BLOCK_BYTES * count {
        return Err(EdfError::InvalidField {
            field: "signal header",
            value: format!("{} bytes for {count} signals", block.len()),
        });
    }
    // Field widths in storage order.
    const WIDTHS: [usize; 10] = [16, 80, 8, 8, 8, 8, 8, 80, 8, 32];
    let mut starts = [0usize; 10];
    for index in 1..WIDTHS.len() {
        starts[index] = starts[index - 1] + WIDTHS[index - 1] * count;
    }
    let at = |column: usize, signal: usize| starts[column] + WIDTHS[column] * signal;

    let mut signals = Vec::with_capacity(count);
    for i in 0..count {
        let signal = SignalHeader {
            label: field(block, at(0, i), 16),
            transducer: field(block, at(1, i), 80),
            physical_dimension: field(block, at(2, i), 8),
            physical_min: parse_number(block, at(3, i), 8, "physical minimum")?,
            physical_max: parse_number(block, at(4, i), 8, "physical maximum")?,
            digital_min: parse_number(block, at(5, i), 8, "digital minimum")?,
            digital_max: parse_number(block, at(6, i), 8, "digital maximum")?,
            prefilter: field(block, at(7, i), 80),
            samples_per_record: parse_number(block, at(8, i), 8, "samples per record")?,
        };
        if !signal.is_annotation() && signal.digital_max == signal.digital_min {
            return Err(EdfError::DigitalRange {
                label: signal.label,
            });
        }
        signals.push(signal);
    }
    Ok(signals)
}

/// Resolves `dd.mm.yy` / `hh.mm.ss`; two-digit years above 84 are 19xx.
pub fn parse_start(date: &str, time: &str) -> Result<NaiveDateTime> {
    let invalid = || EdfError::InvalidStartDate {
        date: date.to_string(),
        time: time.to_string(),
    };
    let parts = |value: &str| -> Option<[u32; 3]> {
        let mut numbers = value.trim().split('.').map(|p| p.trim().parse::<u32>());
        let a = numbers.next()?.ok()?;
        let b = numbers.next()?.ok()?;
        let c = numbers.next()?.ok()?;
        numbers.next().is_none().then_some([a, b, c])
    };
    let [day, month, yy] = parts(date).ok_or_else(invalid)?;
    let [hour, minute, second] = parts(time).ok_or_else(invalid)?;
    let year = if yy > 84 { 1900 + yy } else { 2000 + yy };
    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(invalid)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok(date.and_time(time))
}

fn field(block: &[u8], start: usize, len: usize) -> String {
    // Header text is ASCII by standard; Latin-1 keeps legacy bytes readable.
    block[start..start + len]
        .iter()
        .map(|&b| char::from(b))
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_number<T: std::str::FromStr>(
    block: &[u8],
    start: usize,
    len: usize,
    name: &'static str,
) -> Result<T> {
    let value = field(block, start, len);
    value.parse::<T>().map_err(|_| EdfError::InvalidField { field: name, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_digit_year_cutoff() {
        let early = parse_start("01.02.85", "22.30.00").unwrap();
        assert_eq!(early.to_string(), "1985-02-01 22:30:00");
        let late = parse_start("01.02.24", "07.05.09").unwrap();
        assert_eq!(late.to_string(), "2024-02-01 07:05:09");
    }

    #[test]
    fn rejects_malformed_start() {
        assert!(matches!(
            parse_start("31.02.24", "22.00.00"),
            Err(EdfError::InvalidStartDate { .. })
        ));
        assert!(parse_start("01-02-24", "22.00.00").is_err());
    }

    #[test]
    fn physical_conversion() {
        let signal = SignalHeader {
            label: "EEG C3-A2".to_string(),
            transducer: String::new(),
            physical_dimension: "uV".to_string(),
            physical_min: -200.0,
            physical_max: 200.0,
            digital_min: -2048,
            digital_max: 2047,
            prefilter: String::new(),
            samples_per_record: 256,
        };
        assert!((signal.gain() * 2047.0 + signal.offset() - 200.0).abs() < 1e-9);
        assert!((signal.gain() * -2048.0 + signal.offset() + 200.0).abs() < 1e-9);
        assert_eq!(signal.sample_frequency(2.0), 128.0);
    }
}
