//! Project-level configuration support
//!
//! Loads per-project configuration from `dag-prognosis.toml` or
//! `.dag-prognosis.json` in the directory holding the DAG files.
//!
//! # Configuration Format
//!
//! ```toml
//! # dag-prognosis.toml
//!
//! [imports]
//! extra_trusted = ["company_airflow_plugins"]
//! extra_db_access = ["asyncpg"]
//!
//! [side_effects]
//! extra_modules = ["db"]
//!
//! [providers]
//! mapping_file = "provider_mappings.toml"
//! overrides = { hvac = "apache-airflow-providers-hashicorp" }
//!
//! [performance]
//! cpu_utilization_percent = 75.0
//!
//! [defaults]
//! format = "json"
//! fail_under = 70.0
//! ```

use crate::error::{PrognosisError, Result};
use crate::performance::PerformanceThresholds;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Config file names searched in order; the first one that loads wins
pub const CONFIG_FILE_NAMES: &[&str] = &["dag-prognosis.toml", ".dag-prognosis.json"];

/// Project-level configuration loaded from dag-prognosis.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub imports: ImportsConfig,

    #[serde(default)]
    pub side_effects: SideEffectsConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub performance: PerformanceThresholds,

    #[serde(default)]
    pub defaults: CliDefaults,

    /// Directory the config was loaded from (not serialized)
    #[serde(skip)]
    root: Option<PathBuf>,
}

/// Additional module names for import classification.
/// These extend the built-in sets, they never replace them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ImportsConfig {
    #[serde(default)]
    pub extra_stdlib: Vec<String>,

    #[serde(default)]
    pub extra_trusted: Vec<String>,

    /// Fully qualified module names that indicate direct database access
    #[serde(default)]
    pub extra_db_access: Vec<String>,
}

/// Additional call patterns treated as database operations
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SideEffectsConfig {
    /// Bare function names, e.g. `create_engine`
    #[serde(default)]
    pub extra_methods: Vec<String>,

    /// Receiver names, e.g. `session` in `session.query(...)`
    #[serde(default)]
    pub extra_modules: Vec<String>,

    /// Maintenance utilities, matched as bare names or attributes
    #[serde(default)]
    pub extra_db_functions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvidersConfig {
    /// TOML or JSON `package -> provider` table replacing the built-in one
    #[serde(default)]
    pub mapping_file: Option<PathBuf>,

    /// Entries merged on top of whichever table is in use
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Exit non-zero when any file scores below this
    #[serde(default)]
    pub fail_under: Option<f64>,
}

impl EngineConfig {
    /// Directory this config was loaded from, if it came from disk
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Resolve the provider mapping file against the config directory
    pub fn mapping_file(&self) -> Option<PathBuf> {
        let file = self.providers.mapping_file.as_ref()?;
        if file.is_absolute() {
            return Some(file.clone());
        }
        Some(match &self.root {
            Some(root) => root.join(file),
            None => file.clone(),
        })
    }
}

/// Load project configuration from a directory.
///
/// Searches for configuration files in this order:
/// 1. `dag-prognosis.toml`
/// 2. `.dag-prognosis.json`
///
/// A file that exists but fails to load is skipped with a warning.
/// Returns default configuration if no config file is found.
pub fn load_project_config(dir: &Path) -> EngineConfig {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    EngineConfig::default()
}

/// Load configuration from an explicit file, propagating errors
pub fn load_config_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: EngineConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        other => {
            return Err(PrognosisError::Config(format!(
                "unsupported config format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            )))
        }
    };
    config.root = path.parent().map(Path::to_path_buf);
    Ok(config)
}
