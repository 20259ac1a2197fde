use crate::data::data_provider::DataProvider;
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;
use std::path::Path;
use tracing::info;

/// Build a printable table of the view's visible rows
pub fn format_view<P: DataProvider + ?Sized>(view: &P) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = view
        .get_column_names()
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect();
    table.set_header(headers);

    for row in view.get_visible_rows(0, view.get_row_count()) {
        table.add_row(row);
    }

    table
}

pub fn print_view<P: DataProvider + ?Sized>(view: &P) {
    let count = view.get_row_count();
    if count == 0 {
        println!("{}", "No rows match the current filters.".yellow());
        return;
    }

    println!("{}", format_view(view));
    println!("\n{}", format!("{} rows", count).green());
}

/// Write the visible rows, with a header record, as CSV
pub fn export_view_to_csv<P: DataProvider + ?Sized>(view: &P, path: &Path) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    wtr.write_record(view.get_column_names())?;

    let count = view.get_row_count();
    for row in view.get_visible_rows(0, count) {
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    info!("Exported {} rows to {}", count, path.display());
    Ok(count)
}
