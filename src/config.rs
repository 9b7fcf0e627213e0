//! Settings file support.
//!
//! Every field is optional; command-line flags override whatever the file
//! sets, and the file overrides the built-in defaults.

use std::fs::File;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::Deserialize;

use crate::registry::DEFAULT_FEATURE_DIR;

/// Number of feature records `prune` keeps by default
pub const DEFAULT_MAX_FEATURES: usize = 6;

/// Image tag used when none is given
pub const DEFAULT_IMAGE_TAG: &str = "main";

/// Tool settings, usually loaded from a YAML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub feature_dir: PathBuf,
    pub max_features: usize,
    pub default_appserver_tag: String,
    pub default_ui_tag: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feature_dir: PathBuf::from(DEFAULT_FEATURE_DIR),
            max_features: DEFAULT_MAX_FEATURES,
            default_appserver_tag: DEFAULT_IMAGE_TAG.to_string(),
            default_ui_tag: DEFAULT_IMAGE_TAG.to_string(),
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("feature_dir cannot be empty")]
    EmptyFeatureDir,
    #[error("{0} cannot be empty")]
    EmptyTag(&'static str),
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feature_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyFeatureDir);
        }
        if self.default_appserver_tag.is_empty() {
            return Err(ConfigError::EmptyTag("default_appserver_tag"));
        }
        if self.default_ui_tag.is_empty() {
            return Err(ConfigError::EmptyTag("default_ui_tag"));
        }
        Ok(())
    }
}

/// Load and validate settings from a YAML file
pub fn load_settings(path: &Path) -> Result<Settings> {
    info!("Loading settings from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open settings file '{}'", path.display()))?;
    let settings: Settings = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse settings file '{}'", path.display()))?;

    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path` if given, otherwise use the defaults
pub fn load_settings_or_default(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => load_settings(path),
        None => Ok(Settings::default()),
    }
}
