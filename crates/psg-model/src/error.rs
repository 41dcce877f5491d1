use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown sleep stage: {0}")]
    UnknownSleepStage(String),
    #[error("unknown AASM event: {0}")]
    UnknownEvent(String),
    #[error("unknown recording device: {0}")]
    UnknownDevice(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
