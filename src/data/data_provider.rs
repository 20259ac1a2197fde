//! Data provider traits for abstracting data access
//!
//! These traits are the seam between the column filters and whatever owns
//! the rows. The filters only ever read display strings and hand back a
//! per-column selection; storage, formatting and row visibility stay with
//! the implementation.

use crate::filter::selection::FilterSelection;
use anyhow::Result;
use std::fmt::Debug;

/// Core trait for read-only data access
///
/// Row indices are positions in the currently visible row set.
pub trait DataProvider: Debug {
    /// Get a single row by index
    /// Returns None if the index is out of bounds
    fn get_row(&self, index: usize) -> Option<Vec<String>>;

    /// Get the column names/headers
    fn get_column_names(&self) -> Vec<String>;

    /// Get the total number of rows
    fn get_row_count(&self) -> usize;

    /// Get the total number of columns
    fn get_column_count(&self) -> usize;

    /// Get multiple rows for efficient rendering
    fn get_visible_rows(&self, start: usize, count: usize) -> Vec<Vec<String>> {
        let end = (start + count).min(self.get_row_count());
        (start..end).filter_map(|i| self.get_row(i)).collect()
    }

    /// Get the display width for each column, sampled from the first 100 rows
    fn get_column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.get_column_count()];
        let sample_size = 100.min(self.get_row_count());

        for (i, name) in self.get_column_names().iter().enumerate() {
            if i < widths.len() {
                widths[i] = name.chars().count();
            }
        }

        for row_idx in 0..sample_size {
            if let Some(row) = self.get_row(row_idx) {
                for (col_idx, value) in row.iter().enumerate() {
                    if col_idx < widths.len() {
                        widths[col_idx] = widths[col_idx].max(value.chars().count());
                    }
                }
            }
        }

        widths
    }

    /// Get a single cell value
    /// Returns None if row or column index is out of bounds
    fn get_cell_value(&self, row: usize, col: usize) -> Option<String> {
        self.get_row(row).and_then(|r| r.get(col).cloned())
    }
}

/// A tabular view whose visible rows can be narrowed per column
///
/// Filters are exact matches on a column's display value and compose with
/// AND across columns. Setting a filter only records it; `redraw` recomputes
/// the visible rows.
pub trait FilterableView: DataProvider {
    /// Header text for a column, None when out of range
    fn column_header(&self, column: usize) -> Option<String> {
        self.get_column_names().get(column).cloned()
    }

    /// Display values of every cell in a column across all rows,
    /// ignoring any active filters
    fn column_display_values(&self, column: usize) -> Vec<String>;

    /// Currently recorded filter for a column
    fn column_filter(&self, column: usize) -> FilterSelection;

    /// Record a column filter. Returns true if the stored selection changed.
    fn set_column_filter(&mut self, column: usize, selection: FilterSelection) -> Result<bool>;

    /// Drop every recorded filter
    fn clear_filters(&mut self);

    /// Recompute the visible rows from the recorded filters
    fn redraw(&mut self);

    /// Number of rows before filtering
    fn total_row_count(&self) -> usize;
}
