//! Configuration for the catalog console.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/catalog-console/config.toml` and/or
//! `.catalog/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::filter::LatencyField;

const WORKSPACE_DIR: &str = ".catalog";
const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "catalog-console", "catalog-console")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection to the catalog BFF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Environment variable holding the bearer token, if any.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api/v1/model_catalog".to_string(),
            token_env: "CATALOG_API_TOKEN".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Token from the configured environment variable; empty values count as unset.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub page_size: u32,
    /// Source used when neither a source nor a label is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,
    /// Initial latency field, as `<metric>_<percentile>`.
    pub latency_field: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            default_source: None,
            latency_field: LatencyField::default().to_string(),
        }
    }
}

impl CatalogConfig {
    /// The configured latency field, falling back to the default when the
    /// value does not parse.
    pub fn latency_field(&self) -> LatencyField {
        self.latency_field.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid latency_field in config, using default");
            LatencyField::default()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a daily rolling file.
    pub file_logging: bool,
    /// Log directory; defaults to `<data dir>/logs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_logging: true,
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| project_dirs().map(|d| d.data_dir().join("logs")))
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `CATALOG_`)
/// 3. Workspace-local config (`.catalog/config.toml`)
/// 4. User config (`~/.config/catalog-console/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ConsoleConfig>,
) -> Result<ConsoleConfig> {
    let mut figment = Figment::from(Serialized::defaults(ConsoleConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // CATALOG_API__BASE_URL, CATALOG_CATALOG__PAGE_SIZE, ...
    figment = figment.merge(Env::prefixed("CATALOG_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    Ok(figment.extract().map_err(Box::new)?)
}

pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE))
}

pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(WORKSPACE_DIR).join(CONFIG_FILE)
}

/// Whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

/// Write `config` to `<workspace>/.catalog/config.toml`, returning the path.
pub fn write_workspace_config(workspace: &Path, config: &ConsoleConfig) -> Result<PathBuf> {
    let path = workspace_config_path(workspace);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}
