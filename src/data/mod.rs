//! Data layer for the DataTable/DataView architecture
//!
//! This module separates data storage (`DataTable`) from what is currently
//! visible (`DataView`), with loaders for delimited text and JSON.

pub mod data_provider;
pub mod data_view;
pub mod datatable;
pub mod datatable_loaders;
