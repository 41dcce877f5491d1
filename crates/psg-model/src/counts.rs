use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-recording failure that skips work without aborting the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionFailure {
    /// Subject folder holds no `.edf` file.
    NoEdfFound,
    /// The EDF header or signal layout could not be decoded.
    EdfDecodeFailed,
    /// The annotation dialect parser failed.
    AnnotationParseFailed,
}

impl ConversionFailure {
    /// Key used in the persisted error-count record.
    pub fn key(&self) -> &'static str {
        match self {
            ConversionFailure::NoEdfFound => "EDF_does_not_exist",
            ConversionFailure::EdfDecodeFailed => "edf_reader_not_working",
            ConversionFailure::AnnotationParseFailed => "annot_parse_error",
        }
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error tally of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    #[serde(rename = "EDF_does_not_exist")]
    pub edf_does_not_exist: usize,
    pub edf_reader_not_working: usize,
    pub annot_parse_error: usize,
}

impl ErrorCounts {
    pub fn record(&mut self, failure: ConversionFailure) {
        match failure {
            ConversionFailure::NoEdfFound => self.edf_does_not_exist += 1,
            ConversionFailure::EdfDecodeFailed => self.edf_reader_not_working += 1,
            ConversionFailure::AnnotationParseFailed => self.annot_parse_error += 1,
        }
    }

    pub fn get(&self, failure: ConversionFailure) -> usize {
        match failure {
            ConversionFailure::NoEdfFound => self.edf_does_not_exist,
            ConversionFailure::EdfDecodeFailed => self.edf_reader_not_working,
            ConversionFailure::AnnotationParseFailed => self.annot_parse_error,
        }
    }

    pub fn total(&self) -> usize {
        self.edf_does_not_exist + self.edf_reader_not_working + self.annot_parse_error
    }

    /// Adds the counts of another series.
    pub fn merge(&mut self, other: &ErrorCounts) {
        self.edf_does_not_exist += other.edf_does_not_exist;
        self.edf_reader_not_working += other.edf_reader_not_working;
        self.annot_parse_error += other.annot_parse_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_serialize_with_legacy_keys() {
        let mut counts = ErrorCounts::default();
        counts.record(ConversionFailure::NoEdfFound);
        counts.record(ConversionFailure::AnnotationParseFailed);
        counts.record(ConversionFailure::AnnotationParseFailed);

        let value = serde_json::to_value(counts).unwrap();
        assert_eq!(value["EDF_does_not_exist"], 1);
        assert_eq!(value["edf_reader_not_working"], 0);
        assert_eq!(value["annot_parse_error"], 2);
        assert_eq!(counts.total(), 3);
    }
}
