//! Configuration module for dag-prognosis
//!
//! This module handles:
//! - Project-level configuration (dag-prognosis.toml)
//! - Extensions to the built-in classification name sets
//! - Provider mapping overrides
//! - Performance insight thresholds and CLI defaults

mod classification;
mod engine_config;

pub use classification::ClassificationSets;
pub use engine_config::{
    load_config_file, load_project_config, CliDefaults, EngineConfig, ImportsConfig,
    ProvidersConfig, SideEffectsConfig, CONFIG_FILE_NAMES,
};
