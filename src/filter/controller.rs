use crate::data::data_provider::FilterableView;
use crate::filter::distinct::DistinctValues;
use crate::filter::options::{build_options, FilterOption};
use crate::filter::selection::FilterSelection;
use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, info};

/// The dropdown attached to one column header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFilterControl {
    pub column: usize,
    pub header: String,
    pub options: Vec<FilterOption>,
}

impl ColumnFilterControl {
    /// Raw value of the selected option, empty for the blank option
    pub fn selected_value(&self) -> &str {
        self.options
            .iter()
            .find(|o| o.selected)
            .map(|o| o.value.as_str())
            .unwrap_or("")
    }

    pub fn selected_index(&self) -> usize {
        self.options.iter().position(|o| o.selected).unwrap_or(0)
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    pub fn is_filtering(&self) -> bool {
        !self.selected_value().is_empty()
    }

    fn mark_selected(&mut self, value: &str) {
        for option in &mut self.options {
            option.selected = option.value == value;
        }
    }
}

/// What a selection event did to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The column already had this selection
    Unchanged,
    Applied { visible_rows: usize },
    Cleared { visible_rows: usize },
}

/// Attaches an exact-match dropdown to every column of a filterable view
#[derive(Debug, Clone, Default)]
pub struct ColumnFilterController {
    controls: Vec<ColumnFilterControl>,
    blank_label: String,
}

impl ColumnFilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blank_label(blank_label: impl Into<String>) -> Self {
        Self {
            controls: Vec::new(),
            blank_label: blank_label.into(),
        }
    }

    /// Build one control per column from the view's current data and filters.
    ///
    /// Filters already recorded on the view stay selected and are re-applied,
    /// so running this again never changes the visible rows.
    pub fn initialize<V: FilterableView + ?Sized>(&mut self, view: &mut V) -> &[ColumnFilterControl] {
        let column_count = view.get_column_count();
        let reader: &V = view;
        self.controls = (0..column_count)
            .map(|column| {
                let distinct = DistinctValues::for_column(reader, column);
                let selection = reader.column_filter(column);
                let header = reader.column_header(column).unwrap_or_default();
                debug!(
                    "Column {} '{}': {} distinct values, filter {:?}",
                    column,
                    header,
                    distinct.len(),
                    selection.value()
                );
                ColumnFilterControl {
                    column,
                    header,
                    options: build_options(&distinct, &selection, &self.blank_label),
                }
            })
            .collect();

        if column_count > 0 {
            view.redraw();
        }
        info!("Initialized {} column filters", column_count);
        &self.controls
    }

    /// Apply the option chosen on a column's control.
    ///
    /// An empty `raw_value` clears the column; anything else must be one of
    /// the control's offered values and filters the column to rows whose
    /// display value equals it exactly.
    pub fn on_selection_changed<V: FilterableView + ?Sized>(
        &mut self,
        view: &mut V,
        column: usize,
        raw_value: &str,
    ) -> Result<SelectionOutcome> {
        if column >= view.get_column_count() {
            bail!(
                "Column {} does not exist (table has {} columns)",
                column,
                view.get_column_count()
            );
        }
        if let Some(control) = self.controls.get(column) {
            if !control.has_option(raw_value) {
                bail!(
                    "{:?} is not an option of column '{}'",
                    raw_value,
                    control.header
                );
            }
        }

        let selection = FilterSelection::from_raw(raw_value);
        let cleared = !selection.is_active();
        if !view.set_column_filter(column, selection)? {
            return Ok(SelectionOutcome::Unchanged);
        }
        view.redraw();

        if let Some(control) = self.controls.get_mut(column) {
            control.mark_selected(raw_value);
        }

        let visible_rows = view.get_row_count();
        info!(
            "Column {} filter {:?}: {} of {} rows visible",
            column,
            raw_value,
            visible_rows,
            view.total_row_count()
        );
        Ok(if cleared {
            SelectionOutcome::Cleared { visible_rows }
        } else {
            SelectionOutcome::Applied { visible_rows }
        })
    }

    /// Select a value on the column with the given header
    pub fn select_by_header<V: FilterableView + ?Sized>(
        &mut self,
        view: &mut V,
        header: &str,
        raw_value: &str,
    ) -> Result<SelectionOutcome> {
        let Some(column) = (0..view.get_column_count())
            .find(|&c| view.column_header(c).as_deref() == Some(header))
        else {
            bail!("No column named '{}'", header);
        };
        self.on_selection_changed(view, column, raw_value)
    }

    /// Reset every column to the blank option
    pub fn clear_all<V: FilterableView + ?Sized>(&mut self, view: &mut V) {
        view.clear_filters();
        view.redraw();
        for control in &mut self.controls {
            control.mark_selected("");
        }
    }

    pub fn controls(&self) -> &[ColumnFilterControl] {
        &self.controls
    }

    pub fn control(&self, column: usize) -> Option<&ColumnFilterControl> {
        self.controls.get(column)
    }

    pub fn blank_label(&self) -> &str {
        &self.blank_label
    }
}

/// Attach filters to every managed table. No tables is a no-op.
pub fn initialize_tables<V: FilterableView>(
    views: &mut [V],
    blank_label: &str,
) -> Vec<ColumnFilterController> {
    views
        .iter_mut()
        .map(|view| {
            let mut controller = ColumnFilterController::with_blank_label(blank_label);
            controller.initialize(view);
            controller
        })
        .collect()
}
