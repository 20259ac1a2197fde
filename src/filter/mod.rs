//! Per-column value filters
//!
//! Every column of a view gets a dropdown listing its distinct display
//! values. Choosing one keeps only the rows whose cell shows exactly that
//! text; the blank entry removes the column's filter.

pub mod controller;
pub mod distinct;
pub mod options;
pub mod pattern;
pub mod selection;

pub use controller::{initialize_tables, ColumnFilterControl, ColumnFilterController, SelectionOutcome};
pub use options::FilterOption;
pub use selection::{ColumnFilterSet, FilterSelection};
