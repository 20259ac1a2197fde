//! Configuration module
//!
//! Display, HTML report and loading settings read from config.toml.

pub mod config;
