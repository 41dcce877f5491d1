use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EdfError, Result};
use crate::header::{
    EdfHeader, HEADER_BLOCK_BYTES, SignalHeader, parse_main_header, parse_signal_headers,
};
use crate::tal::{self, EdfAnnotation};

/// A decoded recording: headers, lazy signal loaders and optional annotations.
#[derive(Debug, Clone)]
pub struct EdfRecording {
    pub header: EdfHeader,
    /// One loader per ordinary signal, annotation channels excluded.
    pub signals: Vec<SignalLoader>,
    /// Decoded EDF+ annotations, empty unless requested.
    pub annotations: Vec<EdfAnnotation>,
}

/// Decodes EDF files into headers and lazily readable signals.
pub trait EdfDecoder {
    fn decode(&self, path: &Path, want_annotations: bool) -> Result<EdfRecording>;
}

/// Reads EDF and EDF+ files from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdfFileDecoder;

impl EdfDecoder for EdfFileDecoder {
    fn decode(&self, path: &Path, want_annotations: bool) -> Result<EdfRecording> {
        let mut reader = open(path)?;
        let mut header = read_header_from(&mut reader, path)?;
        if header.data_records < 0 {
            header.data_records = infer_record_count(path, &header)?;
        }
        let annotations = if want_annotations {
            read_annotations_from(&mut reader, path, &header)?
        } else {
            Vec::new()
        };
        let signals = header
            .signals
            .iter()
            .enumerate()
            .filter(|(_, signal)| !signal.is_annotation())
            .map(|(index, _)| SignalLoader::new(path, &header, index))
            .collect();
        debug!(
            path = %path.display(),
            signals = header.signals.len(),
            data_records = header.data_records,
            annotations = annotations.len(),
            "decoded EDF header"
        );
        Ok(EdfRecording {
            header,
            signals,
            annotations,
        })
    }
}

/// Reads the main and signal headers of `path`.
pub fn read_header(path: &Path) -> Result<EdfHeader> {
    let mut reader = open(path)?;
    read_header_from(&mut reader, path)
}

/// Decodes every annotation of the EDF+ annotation channel.
///
/// Files without an annotation channel yield an empty list.
pub fn read_annotations(path: &Path) -> Result<Vec<EdfAnnotation>> {
    let mut reader = open(path)?;
    let mut header = read_header_from(&mut reader, path)?;
    if header.data_records < 0 {
        header.data_records = infer_record_count(path, &header)?;
    }
    read_annotations_from(&mut reader, path, &header)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| EdfError::Open {
            path: path.to_path_buf(),
            source,
        })
}

fn read_header_from<R: Read>(reader: &mut R, path: &Path) -> Result<EdfHeader> {
    let mut block = [0u8; HEADER_BLOCK_BYTES];
    read_exact(reader, &mut block, path)?;
    let (mut header, count) = parse_main_header(&block)?;
    let mut signal_block = vec![0u8; HEADER_BLOCK_BYTES * count];
    read_exact(reader, &mut signal_block, path)?;
    header.signals = parse_signal_headers(&signal_block, count)?;
    if header.record_duration <= 0.0 && header.signals.iter().any(|s| !s.is_annotation()) {
        return Err(EdfError::InvalidField {
            field: "record duration",
            value: header.record_duration.to_string(),
        });
    }
    Ok(header)
}

fn read_annotations_from<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    header: &EdfHeader,
) -> Result<Vec<EdfAnnotation>> {
    let Some(channel) = header.annotation_signal() else {
        return Ok(Vec::new());
    };
    let record_bytes = header.record_bytes();
    let channel_offset = header.signal_offset(channel);
    let mut buffer = vec![0u8; header.signals[channel].samples_per_record * 2];
    let mut annotations = Vec::new();
    for record in 0..header.data_records.max(0) as usize {
        let position = header.header_bytes + record * record_bytes + channel_offset;
        seek(reader, position, path)?;
        read_exact(reader, &mut buffer, path)?;
        annotations.extend(tal::parse_record(&buffer, record)?);
    }
    Ok(annotations)
}

fn infer_record_count(path: &Path, header: &EdfHeader) -> Result<i64> {
    let length = std::fs::metadata(path)
        .map_err(|source| EdfError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len() as usize;
    let record_bytes = header.record_bytes().max(1);
    Ok((length.saturating_sub(header.header_bytes) / record_bytes) as i64)
}

fn seek<R: Seek>(reader: &mut R, position: usize, path: &Path) -> Result<()> {
    reader
        .seek(SeekFrom::Start(position as u64))
        .map(|_| ())
        .map_err(|source| EdfError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn read_exact<R: Read>(reader: &mut R, buffer: &mut [u8], path: &Path) -> Result<()> {
    reader.read_exact(buffer).map_err(|source| EdfError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads one signal on demand.
///
/// Holds only the file path and record geometry; samples are read when
/// [`SignalLoader::load`] is called.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalLoader {
    path: PathBuf,
    header: SignalHeader,
    sample_frequency: f64,
    data_offset: usize,
    record_bytes: usize,
    signal_offset: usize,
    data_records: usize,
}

impl SignalLoader {
    fn new(path: &Path, header: &EdfHeader, index: usize) -> Self {
        let signal = header.signals[index].clone();
        Self {
            path: path.to_path_buf(),
            sample_frequency: signal.sample_frequency(header.record_duration),
            header: signal,
            data_offset: header.header_bytes,
            record_bytes: header.record_bytes(),
            signal_offset: header.signal_offset(index),
            data_records: header.data_records.max(0) as usize,
        }
    }

    pub fn header(&self) -> &SignalHeader {
        &self.header
    }

    pub fn label(&self) -> &str {
        &self.header.label
    }

    pub fn sample_frequency(&self) -> f64 {
        self.sample_frequency
    }

    pub fn sample_count(&self) -> usize {
        self.data_records * self.header.samples_per_record
    }

    /// Reads all samples and converts them to physical units.
    pub fn load(&self) -> Result<Vec<f32>> {
        let gain = self.header.gain();
        let offset = self.header.offset();
        Ok(self
            .load_digital()?
            .into_iter()
            .map(|digital| (gain * f64::from(digital) + offset) as f32)
            .collect())
    }

    /// Reads all samples as stored.
    pub fn load_digital(&self) -> Result<Vec<i16>> {
        let mut reader = open(&self.path)?;
        let mut buffer = vec![0u8; self.header.samples_per_record * 2];
        let mut samples = Vec::with_capacity(self.sample_count());
        for record in 0..self.data_records {
            let position = self.data_offset + record * self.record_bytes + self.signal_offset;
            seek(&mut reader, position, &self.path)?;
            read_exact(&mut reader, &mut buffer, &self.path)?;
            samples.extend(
                buffer
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
            );
        }
        Ok(samples)
    }
}
