//! Command-line front end for the revision-rate simulator
//!
//! Loads run files and hazard-ratio tables from YAML, drives
//! [`revsim_core`] and renders results as JSON or plain-text tables.

pub mod logging;
pub mod provider;
pub mod report;
pub mod run_file;

pub use logging::init_logging;
pub use provider::YamlHazardRatioSource;
pub use run_file::RunFile;
