use crate::data::data_provider::FilterableView;
use std::collections::BTreeSet;

/// Sorted unique display strings of one column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctValues {
    values: Vec<String>,
}

impl DistinctValues {
    pub fn from_display_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let unique: BTreeSet<String> = values.into_iter().collect();
        Self {
            values: unique.into_iter().collect(),
        }
    }

    /// Collect a column's values across all rows of the view's source
    pub fn for_column<V: FilterableView + ?Sized>(view: &V, column: usize) -> Self {
        Self::from_display_values(view.column_display_values(column))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values
            .binary_search_by(|probe| probe.as_str().cmp(value))
            .is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|s| s.as_str())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
