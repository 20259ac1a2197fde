use crate::data::datatable::{DataRow, DataValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The active filter of a single column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSelection {
    /// Every row passes
    #[default]
    None,
    /// Only rows whose display value equals this text pass
    Value(String),
}

impl FilterSelection {
    /// Interpret a raw option value; the empty string means no filter
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            FilterSelection::None
        } else {
            FilterSelection::Value(raw.to_string())
        }
    }

    /// Raw option value for this selection, empty when inactive
    pub fn as_raw(&self) -> &str {
        match self {
            FilterSelection::None => "",
            FilterSelection::Value(v) => v,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            FilterSelection::None => None,
            FilterSelection::Value(v) => Some(v),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FilterSelection::Value(_))
    }

    /// Literal equality against the cell's display value
    pub fn matches(&self, cell: &DataValue) -> bool {
        match self {
            FilterSelection::None => true,
            FilterSelection::Value(v) => cell.display_eq(v),
        }
    }
}

/// Per-column equality predicates combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilterSet {
    filters: BTreeMap<usize, String>,
}

impl ColumnFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: usize) -> FilterSelection {
        self.filters
            .get(&column)
            .map(|v| FilterSelection::Value(v.clone()))
            .unwrap_or_default()
    }

    /// Store a selection for a column. Returns true if anything changed.
    pub fn set(&mut self, column: usize, selection: FilterSelection) -> bool {
        match selection {
            FilterSelection::None => self.filters.remove(&column).is_some(),
            FilterSelection::Value(value) => match self.filters.get(&column) {
                Some(existing) if *existing == value => false,
                _ => {
                    self.filters.insert(column, value);
                    true
                }
            },
        }
    }

    pub fn clear_column(&mut self, column: usize) -> bool {
        self.filters.remove(&column).is_some()
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn active_count(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn is_active(&self, column: usize) -> bool {
        self.filters.contains_key(&column)
    }

    /// Active filters in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.filters.iter().map(|(col, v)| (*col, v.as_str()))
    }

    /// True when the row satisfies every active column filter.
    /// A filter on a column the row does not have never matches.
    pub fn matches_row(&self, row: &DataRow) -> bool {
        self.filters.iter().all(|(col, value)| {
            row.get(*col)
                .map(|cell| cell.display_eq(value))
                .unwrap_or(false)
        })
    }
}
