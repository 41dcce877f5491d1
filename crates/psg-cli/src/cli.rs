//! CLI argument definitions for the PSG converter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "psg-convert",
    version,
    about = "Sleep-lab PSG converter - normalize scorer annotations into subject folders",
    long_about = "Convert polysomnography recordings and their scorer exports into\n\
                  subject folders with metadata, hypnograms and AASM events.\n\n\
                  Reads RemLogic, BrainRT, Deltamed and CSV annotation exports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert local series folders into a dataset.
    Convert(ConvertArgs),

    /// Convert and upload the unconverted recordings of archive years.
    Sync(SyncArgs),

    /// List the stage and event label classification tables.
    Labels,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Folder holding one sub-folder per series (e.g. per year).
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Series folder to convert (repeatable).
    #[arg(long = "series", value_name = "NAME", required = true)]
    pub series: Vec<String>,

    /// Dataset name, used as the top-level output folder.
    #[arg(long = "dataset", value_name = "NAME", default_value = "psg")]
    pub dataset: String,

    /// Output root for converted datasets.
    #[arg(
        long = "output-dir",
        env = "SLF_OUTPUT_PATH",
        value_name = "DIR",
        default_value = "slf-output"
    )]
    pub output_dir: PathBuf,

    /// Folder holding the usage ledger.
    #[arg(
        long = "log-dir",
        env = "LOG_OUTPUT_PATH",
        value_name = "DIR",
        default_value = "logs"
    )]
    pub log_dir: PathBuf,

    /// Convert subjects already recorded in the usage ledger.
    #[arg(long = "reconvert")]
    pub reconvert: bool,

    /// Skip writing channel sample data.
    #[arg(long = "no-sample-data")]
    pub no_sample_data: bool,

    /// Convert and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct SyncArgs {
    /// Archive years to reconcile.
    #[arg(value_name = "YEAR", required = true)]
    pub years: Vec<String>,

    /// Mount point of the recording archive.
    #[arg(long = "remote-root", env = "PSG_REMOTE_ROOT", value_name = "DIR")]
    pub remote_root: PathBuf,

    /// Output root for converted datasets.
    #[arg(
        long = "output-dir",
        env = "SLF_OUTPUT_PATH",
        value_name = "DIR",
        default_value = "slf-output"
    )]
    pub output_dir: PathBuf,

    /// Folder holding the usage ledger.
    #[arg(
        long = "log-dir",
        env = "LOG_OUTPUT_PATH",
        value_name = "DIR",
        default_value = "logs"
    )]
    pub log_dir: PathBuf,

    /// Convert subjects already recorded in the usage ledger.
    #[arg(long = "reconvert")]
    pub reconvert: bool,

    /// Skip writing channel sample data.
    #[arg(long = "no-sample-data")]
    pub no_sample_data: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
