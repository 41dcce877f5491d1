use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use psg_cli::types::{ConvertResult, SyncResult};

pub fn print_convert_summary(result: &ConvertResult) {
    println!("Dataset: {}", result.dataset);
    match &result.output_dir {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: dry run, nothing written"),
    }
    println!("Usage ledger: {}", result.ledger_path.display());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Series"),
        header_cell("Subjects"),
        header_cell("Annotated"),
        header_cell("Channels"),
        header_cell("No EDF"),
        header_cell("EDF unreadable"),
        header_cell("Annotation errors"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_annotated = 0usize;
    let mut total_arrays = 0usize;
    for series in &result.series {
        total_annotated += series.annotated;
        total_arrays += series.sample_arrays;
        let counts = &series.error_counts;
        table.add_row(vec![
            Cell::new(&series.name),
            Cell::new(series.subjects),
            Cell::new(series.annotated),
            Cell::new(series.sample_arrays),
            count_cell(counts.edf_does_not_exist, Color::Yellow),
            count_cell(counts.edf_reader_not_working, Color::Red),
            count_cell(counts.annot_parse_error, Color::Red),
        ]);
    }
    let totals = result.total_errors();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.total_subjects()).add_attribute(Attribute::Bold),
        Cell::new(total_annotated).add_attribute(Attribute::Bold),
        Cell::new(total_arrays).add_attribute(Attribute::Bold),
        count_cell(totals.edf_does_not_exist, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(totals.edf_reader_not_working, Color::Red).add_attribute(Attribute::Bold),
        count_cell(totals.annot_parse_error, Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    if result.new_ledger_entries > 0 {
        println!("Recorded {} new subject(s)", result.new_ledger_entries);
    }
}

pub fn print_sync_summary(result: &SyncResult) {
    println!("Usage ledger: {}", result.ledger_path.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Year"),
        header_cell("Downloaded"),
        header_cell("Converted"),
        header_cell("Uploaded"),
        header_cell("Skipped patients"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for report in &result.years {
        let skipped = if report.skipped_patients.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(report.skipped_patients.join(", ")).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&report.year),
            Cell::new(report.downloaded_patients),
            Cell::new(report.converted_subjects),
            Cell::new(report.uploaded.len()),
            skipped,
        ]);
    }
    for failure in &result.failures {
        table.add_row(vec![
            Cell::new(&failure.year).fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    println!("{table}");
    if result.has_failures() {
        eprintln!("Errors:");
        for failure in &result.failures {
            eprintln!("- {}: {}", failure.year, failure.error);
        }
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
