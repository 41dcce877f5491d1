//! EDF+ time-stamped annotation lists.
//!
//! Each data record of the `EDF Annotations` signal holds one or more TALs:
//! `+onset[\x15duration]\x14text\x14[text\x14...]\x00`. The first TAL of a
//! record only keeps time and has no text.

use crate::error::{EdfError, Result};

const DURATION_MARK: u8 = 0x15;
const TEXT_MARK: u8 = 0x14;

/// One annotation decoded from the EDF+ annotation channel.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfAnnotation {
    /// Seconds from recording start.
    pub onset: f64,
    /// Seconds, absent when the TAL omits it.
    pub duration: Option<f64>,
    pub label: String,
}

/// Decodes all annotations stored in one data record.
pub fn parse_record(bytes: &[u8], record: usize) -> Result<Vec<EdfAnnotation>> {
    let mut annotations = Vec::new();
    for tal in bytes.split(|&b| b == 0).filter(|tal| !tal.is_empty()) {
        let mut parts = tal.split(|&b| b == TEXT_MARK);
        let timing = parts.next().unwrap_or_default();
        let (onset, duration) = parse_timing(timing, record)?;
        for text in parts.filter(|text| !text.is_empty()) {
            annotations.push(EdfAnnotation {
                onset,
                duration,
                label: String::from_utf8_lossy(text).into_owned(),
            });
        }
    }
    Ok(annotations)
}

fn parse_timing(timing: &[u8], record: usize) -> Result<(f64, Option<f64>)> {
    let malformed = |reason: String| EdfError::MalformedTal { record, reason };
    let mut pieces = timing.splitn(2, |&b| b == DURATION_MARK);
    let onset_bytes = pieces.next().unwrap_or_default();
    let onset_text = std::str::from_utf8(onset_bytes)
        .map_err(|_| malformed("onset is not ASCII".to_string()))?;
    if !onset_text.starts_with(['+', '-']) {
        return Err(malformed(format!("onset '{onset_text}' has no sign")));
    }
    let onset = onset_text
        .parse::<f64>()
        .map_err(|_| malformed(format!("onset '{onset_text}' is not a number")))?;
    let duration = match pieces.next() {
        Some(bytes) if !bytes.is_empty() => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| malformed("duration is not ASCII".to_string()))?;
            Some(
                text.parse::<f64>()
                    .map_err(|_| malformed(format!("duration '{text}' is not a number")))?,
            )
        }
        _ => None,
    };
    Ok((onset, duration))
}
