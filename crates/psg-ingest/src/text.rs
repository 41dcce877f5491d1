//! Byte-level file access and text decoding.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{IngestError, Result};

/// Reads a whole file, mapping a missing file to [`IngestError::FileNotFound`].
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Decodes ISO-8859-1 bytes; every byte maps to one code point.
pub fn decode_latin1(bytes: &[u8]) -> String {
    encoding_rs::mem::decode_latin1(bytes).into_owned()
}

/// Decodes UTF-16 text, little-endian unless a byte order mark says otherwise.
pub fn decode_utf16(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::UTF_16LE.decode(bytes);
    text.into_owned()
}

pub fn read_latin1(path: &Path) -> Result<String> {
    read_bytes(path).map(|bytes| decode_latin1(&bytes))
}

pub fn read_utf16(path: &Path) -> Result<String> {
    read_bytes(path).map(|bytes| decode_utf16(&bytes))
}

/// Parses `value` with a chrono format, reporting the file on failure.
pub(crate) fn parse_datetime(
    value: &str,
    format: &'static str,
    path: &Path,
) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format).map_err(|_| IngestError::InvalidDateTime {
        value: value.to_string(),
        format,
        path: path.to_path_buf(),
    })
}
