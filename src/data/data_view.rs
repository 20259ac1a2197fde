use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::debug;

use crate::data::data_provider::{DataProvider, FilterableView};
use crate::data::datatable::{DataRow, DataTable};
use crate::filter::selection::{ColumnFilterSet, FilterSelection};

/// A view over a DataTable that narrows the visible rows with per-column
/// filters without modifying the underlying data
#[derive(Debug, Clone)]
pub struct DataView {
    /// The underlying immutable data source
    source: Arc<DataTable>,

    /// Row indices that are visible (after filtering)
    visible_rows: Vec<usize>,

    /// Recorded column filters, applied on redraw
    filters: ColumnFilterSet,
}

impl DataView {
    /// Create a new view showing all data from the table
    pub fn new(source: Arc<DataTable>) -> Self {
        let row_count = source.row_count();
        Self {
            source,
            visible_rows: (0..row_count).collect(),
            filters: ColumnFilterSet::new(),
        }
    }

    /// Table name of the source
    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Get the source DataTable
    pub fn source(&self) -> &DataTable {
        &self.source
    }

    pub fn filters(&self) -> &ColumnFilterSet {
        &self.filters
    }

    /// Get visible row indices into the source table
    pub fn visible_row_indices(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Visible row by position in the filtered set
    pub fn visible_row(&self, index: usize) -> Option<&DataRow> {
        let row_idx = *self.visible_rows.get(index)?;
        self.source.rows.get(row_idx)
    }

    /// All visible rows, in source order
    pub fn visible_rows(&self) -> impl Iterator<Item = &DataRow> {
        self.visible_rows
            .iter()
            .filter_map(move |&idx| self.source.rows.get(idx))
    }

    /// Column index by header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.source.get_column_index(name)
    }
}

impl DataProvider for DataView {
    fn get_row(&self, index: usize) -> Option<Vec<String>> {
        self.visible_row(index)
            .map(|row| row.values.iter().map(|v| v.to_string()).collect())
    }

    fn get_column_names(&self) -> Vec<String> {
        self.source.column_names()
    }

    fn get_row_count(&self) -> usize {
        self.visible_rows.len()
    }

    fn get_column_count(&self) -> usize {
        self.source.column_count()
    }
}

impl FilterableView for DataView {
    fn column_header(&self, column: usize) -> Option<String> {
        self.source.columns.get(column).map(|c| c.name.clone())
    }

    fn column_display_values(&self, column: usize) -> Vec<String> {
        self.source.column_display_values(column)
    }

    fn column_filter(&self, column: usize) -> FilterSelection {
        self.filters.get(column)
    }

    fn set_column_filter(&mut self, column: usize, selection: FilterSelection) -> Result<bool> {
        if column >= self.source.column_count() {
            return Err(anyhow!(
                "Column index {} out of bounds for table '{}' with {} columns",
                column,
                self.source.name,
                self.source.column_count()
            ));
        }
        Ok(self.filters.set(column, selection))
    }

    fn clear_filters(&mut self) {
        self.filters.clear_all();
    }

    fn redraw(&mut self) {
        let source = &self.source;
        let filters = &self.filters;
        self.visible_rows = if filters.is_empty() {
            (0..source.row_count()).collect()
        } else {
            source
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| filters.matches_row(row))
                .map(|(idx, _)| idx)
                .collect()
        };
        debug!(
            "Redraw '{}': {} of {} rows visible with {} active filters",
            source.name,
            self.visible_rows.len(),
            source.row_count(),
            filters.active_count()
        );
    }

    fn total_row_count(&self) -> usize {
        self.source.row_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataColumn, DataValue};

    fn create_view() -> DataView {
        let mut table = DataTable::new("fruit");
        table.add_column(DataColumn::new("name"));
        table.add_column(DataColumn::new("colour"));
        for (name, colour) in [("apple", "red"), ("banana", "yellow"), ("cherry", "red")] {
            table
                .add_row(DataRow::new(vec![
                    DataValue::String(name.to_string()),
                    DataValue::String(colour.to_string()),
                ]))
                .unwrap();
        }
        DataView::new(Arc::new(table))
    }

    #[test]
    fn test_new_view_shows_everything() {
        let view = create_view();
        assert_eq!(view.get_row_count(), 3);
        assert_eq!(view.total_row_count(), 3);
        assert_eq!(view.get_column_count(), 2);
        assert_eq!(view.name(), "fruit");
    }

    #[test]
    fn test_filter_applies_on_redraw() {
        let mut view = create_view();
        assert!(view
            .set_column_filter(1, FilterSelection::from_raw("red"))
            .unwrap());
        // Recorded but not yet applied
        assert_eq!(view.get_row_count(), 3);

        view.redraw();
        assert_eq!(view.visible_row_indices(), &[0, 2]);
        assert_eq!(view.get_row(1).unwrap(), vec!["cherry", "red"]);
    }

    #[test]
    fn test_clear_filters() {
        let mut view = create_view();
        view.set_column_filter(0, FilterSelection::from_raw("apple"))
            .unwrap();
        view.redraw();
        assert_eq!(view.get_row_count(), 1);

        view.clear_filters();
        view.redraw();
        assert_eq!(view.get_row_count(), 3);
        assert_eq!(view.column_filter(0), FilterSelection::None);
    }

    #[test]
    fn test_out_of_range_column_is_rejected() {
        let mut view = create_view();
        let err = view
            .set_column_filter(9, FilterSelection::from_raw("x"))
            .unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
        assert!(view.filters().is_empty());
    }

    #[test]
    fn test_display_values_ignore_filters() {
        let mut view = create_view();
        view.set_column_filter(1, FilterSelection::from_raw("yellow"))
            .unwrap();
        view.redraw();
        assert_eq!(
            view.column_display_values(0),
            vec!["apple", "banana", "cherry"]
        );
        assert_eq!(view.column_header(1).as_deref(), Some("colour"));
        assert_eq!(view.column_header(2), None);
    }
}
