pub mod config;
pub mod data;
pub mod export;
pub mod filter;
pub mod ui;
pub mod utils;
pub mod widgets;
