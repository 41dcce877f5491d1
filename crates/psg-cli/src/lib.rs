//! Library components of the PSG conversion command line.

pub mod logging;
pub mod pipeline;
pub mod types;
