//! Configuration module for the engine broker.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `BROKER_` and use double
//! underscores to separate nested levels:
//! - `BROKER_COMPLETER__PYTHON_BINARY_PATH=/usr/bin/python3` sets `completer.python_binary_path`
//! - `BROKER_COMPLETER__MAX_NUM_CANDIDATES=20` sets `completer.max_num_candidates`
//! - `BROKER_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BrokerError, BrokerResult};
use crate::navigation::DEFAULT_MAX_HOPS;

/// Directory holding the global settings file
pub const CONFIG_DIR: &str = ".broker";

/// Symbol search limit used when `max_num_candidates` is negative
pub const UNBOUNDED_SYMBOL_LIMIT: usize = 100;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .broker is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Log filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Semantic completer settings
    #[serde(default)]
    pub completer: CompleterConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CompleterConfig {
    /// Filetype served by the completer
    #[serde(default = "default_language")]
    pub language: String,

    /// Interpreter used when no hook supplies one; empty means the system default
    #[serde(default)]
    pub python_binary_path: String,

    /// Result cap for symbol search; negative means 100
    #[serde(default = "default_max_num_candidates")]
    pub max_num_candidates: i64,

    /// Hop cap of "go to implementation"
    #[serde(default = "default_max_hops")]
    pub implementation_max_hops: usize,

    /// Name of the per-project hook file looked up from each source file
    #[serde(default = "default_hook_file_name")]
    pub hook_file_name: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_log_filter() -> String {
    "warn".to_string()
}
fn default_language() -> String {
    "python".to_string()
}
fn default_max_num_candidates() -> i64 {
    50
}
fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}
fn default_hook_file_name() -> String {
    ".broker_conf.toml".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            log_filter: default_log_filter(),
            completer: CompleterConfig::default(),
        }
    }
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            python_binary_path: String::new(),
            max_num_candidates: default_max_num_candidates(),
            implementation_max_hops: default_max_hops(),
            hook_file_name: default_hook_file_name(),
        }
    }
}

impl CompleterConfig {
    /// Effective symbol search limit.
    pub fn symbol_limit(&self) -> usize {
        usize::try_from(self.max_num_candidates).unwrap_or(UNBOUNDED_SYMBOL_LIMIT)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .broker directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores
            // stay part of the field name.
            .merge(Env::prefixed("BROKER_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for a .broker directory from the
    /// current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .broker is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> BrokerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BrokerError::Config {
                reason: format!("cannot create {}: {e}", parent.display()),
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| BrokerError::Config {
            reason: e.to_string(),
        })?;
        std::fs::write(path, toml_string).map_err(|e| BrokerError::Config {
            reason: format!("cannot write {}: {e}", path.display()),
        })
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> BrokerResult<PathBuf> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Same as [`Settings::init_config_file`], rooted at `directory`.
    pub fn init_config_file_in(directory: &Path, force: bool) -> BrokerResult<PathBuf> {
        let config_path = directory.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err(BrokerError::Config {
                reason: "configuration file already exists. Use --force to overwrite".into(),
            });
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BrokerError::Config {
                reason: format!("cannot create {}: {e}", parent.display()),
            })?;
        }

        let template = format!(
            r#"# Engine broker configuration

# Version of the configuration schema
version = 1

# Global debug mode (forces the "debug" log filter)
debug = false

# Log filter used when RUST_LOG is not set
log_filter = "warn"

[completer]
# Filetype served by the semantic completer
language = "python"

# Interpreter used for files whose hook does not name one.
# Empty means the system default runtime. "~", $VAR and ${{VAR}} are expanded.
python_binary_path = ""

# Maximum number of symbol search results (negative means 100)
max_num_candidates = 50

# Maximum number of definition hops for "go to implementation"
implementation_max_hops = {DEFAULT_MAX_HOPS}

# Per-project hook file, searched from each source file upwards
hook_file_name = ".broker_conf.toml"
"#
        );

        std::fs::write(&config_path, template).map_err(|e| BrokerError::Config {
            reason: format!("cannot write {}: {e}", config_path.display()),
        })?;

        Ok(config_path)
    }
}
