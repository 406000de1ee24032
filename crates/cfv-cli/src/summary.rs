use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cfv_dashboard::{DashboardView, format_correlation};
use cfv_model::SelectedStat;

use cfv_cli::types::ProcessResult;

pub fn print_process_summary(result: &ProcessResult) {
    println!("Period: {}", result.period);
    println!("Scope: {}", result.scope);
    if result.dry_run {
        println!("Output: (dry run, nothing written)");
    } else {
        println!("Output: {}", result.save_dir.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Files"),
        header_cell("Skipped"),
        header_cell("Input rows"),
        header_cell("Dropped"),
        header_cell("Output rows"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for stage in &result.stages {
        table.add_row(vec![
            Cell::new(stage.stage)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(stage.files),
            count_cell(stage.skipped_files, Color::Yellow),
            Cell::new(stage.input_rows),
            count_cell(stage.dropped_rows, Color::Yellow),
            Cell::new(stage.output_rows),
        ]);
    }
    println!("{table}");

    if !result.exports.is_empty() {
        let mut exports = Table::new();
        exports.set_header(vec![
            header_cell("Kind"),
            header_cell("File"),
            header_cell("Rows"),
        ]);
        apply_table_style(&mut exports);
        align_column(&mut exports, 2, CellAlignment::Right);
        for file in &result.exports {
            let name = file
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            exports.add_row(vec![
                Cell::new(file.kind.prefix()),
                Cell::new(name),
                Cell::new(file.rows),
            ]);
        }
        println!("{exports}");
    }

    if result.decreases > 0 {
        println!(
            "Cumulative decreases: {} (see warnings in the log)",
            result.decreases
        );
    }
    if !result.skipped.is_empty() {
        eprintln!("Skipped files:");
        for skipped in &result.skipped {
            eprintln!("- {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

pub fn print_correlations(view: &DashboardView) {
    println!("Focus: {}", view.focus);
    println!("Range: {} to {}", view.range.start, view.range.end);
    let mut table = Table::new();
    table.set_header(vec![header_cell("Statistic"), header_cell("r")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (stat, r) in &view.correlations {
        let label = if *stat == view.selected {
            Cell::new(stat.label()).add_attribute(Attribute::Bold)
        } else {
            Cell::new(stat.label())
        };
        let value = match r {
            Some(value) => Cell::new(format_correlation(Some(*value))).fg(correlation_color(*value)),
            None => dim_cell(format_correlation(None)),
        };
        table.add_row(vec![label, value]);
    }
    println!("{table}");
}

pub fn print_stats() {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Column"), header_cell("Label")]);
    apply_table_style(&mut table);
    let default = SelectedStat::default();
    for stat in SelectedStat::all() {
        let column = if stat == default {
            Cell::new(format!("{} (default)", stat.column()))
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(stat.column()).fg(Color::Blue)
        };
        table.add_row(vec![column, Cell::new(stat.label())]);
    }
    println!("{table}");
}

fn correlation_color(r: f64) -> Color {
    if r >= 0.5 {
        Color::Green
    } else if r <= -0.5 {
        Color::Red
    } else {
        Color::Reset
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
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
