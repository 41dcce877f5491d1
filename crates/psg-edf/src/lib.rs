//! EDF/EDF+ decoding for polysomnography recordings.
//!
//! The decoder reads headers eagerly and signal data lazily: a
//! [`SignalLoader`] keeps only the record geometry and reads samples from disk
//! when asked. EDF+ annotations (TALs) are decoded on request.
//!
//! # Example
//!
//! ```ignore
//! use psg_edf::{EdfDecoder, EdfFileDecoder};
//!
//! let recording = EdfFileDecoder.decode(Path::new("FE0001T1-PA0042V1C1.edf"), true)?;
//! println!("start: {}", recording.header.start);
//! for annotation in &recording.annotations {
//!     println!("{} {}", annotation.onset, annotation.label);
//! }
//! ```

mod error;
mod header;
mod reader;
mod tal;

#[doc(hidden)]
pub mod testing;

// === Error Types ===
pub use error::{EdfError, Result};

// === Headers ===
pub use header::{ANNOTATION_LABEL, EdfHeader, SignalHeader, parse_start};

// === Decoding ===
pub use reader::{
    EdfDecoder, EdfFileDecoder, EdfRecording, SignalLoader, read_annotations, read_header,
};
pub use tal::EdfAnnotation;
