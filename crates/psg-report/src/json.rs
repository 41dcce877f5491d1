//! File helpers shared by the writers.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{ReportError, Result};

pub(crate) fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ReportError::Io {
        operation: "create directory",
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|source| ReportError::Io {
        operation: "create",
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ReportError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|source| ReportError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })
}

/// Writes samples as consecutive little-endian `f32`.
pub(crate) fn write_f32_le(path: &Path, samples: &[f32]) -> Result<()> {
    let io_error = |source: std::io::Error| ReportError::Io {
        operation: "write",
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    for sample in samples {
        writer.write_all(&sample.to_le_bytes()).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)
}
