use anyhow::Result;
use comfy_table::{Cell, Table};

use psg_cli::pipeline::{ConvertOptions, SyncOptions, run_convert as convert, run_sync as sync};
use psg_cli::types::{ConvertResult, SyncResult};
use psg_edf::EdfFileDecoder;
use psg_transform::{AASM_EVENT_MAPPING, STAGE_MAPPING};

use crate::cli::{ConvertArgs, SyncArgs};
use crate::summary::{apply_table_style, header_cell};

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let options = ConvertOptions {
        input_dir: args.input_dir.clone(),
        dataset: args.dataset.clone(),
        series: args.series.clone(),
        output_dir: args.output_dir.clone(),
        log_dir: args.log_dir.clone(),
        reconvert: args.reconvert,
        sample_data: !args.no_sample_data,
        dry_run: args.dry_run,
    };
    convert(&options, &EdfFileDecoder)
}

pub fn run_sync(args: &SyncArgs) -> Result<SyncResult> {
    let options = SyncOptions {
        remote_root: args.remote_root.clone(),
        years: args.years.clone(),
        output_dir: args.output_dir.clone(),
        log_dir: args.log_dir.clone(),
        reconvert: args.reconvert,
        sample_data: !args.no_sample_data,
    };
    sync(&options, &EdfFileDecoder)
}

pub fn run_labels() -> Result<()> {
    let mut stages = Table::new();
    stages.set_header(vec![header_cell("Stage label"), header_cell("Stage")]);
    apply_table_style(&mut stages);
    for (label, stage) in STAGE_MAPPING {
        stages.add_row(vec![Cell::new(label), Cell::new(stage.as_str())]);
    }
    println!("{stages}");

    let mut events = Table::new();
    events.set_header(vec![header_cell("Event label"), header_cell("AASM event")]);
    apply_table_style(&mut events);
    for (label, event) in AASM_EVENT_MAPPING {
        events.add_row(vec![Cell::new(label), Cell::new(event.as_str())]);
    }
    println!("{events}");
    Ok(())
}
