//! Preference configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock behavior: key `theme`, class `dark`, default mode `light`, storage
//! in the user's config directory.
//!
//! ```yaml
//! storage_key: theme
//! dark_class: dark
//! default_mode: light
//! store_path: /var/lib/kiosk/preferences.json
//! palette_path: ./palette.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::env::EnvReader;
use crate::error::ThemeError;
use crate::mode::ColorMode;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "UMBRA_CONFIG";
/// Environment variable naming the umbra data directory.
pub const HOME_ENV: &str = "UMBRA_HOME";
/// File name of the preference store inside the data directory.
pub const STORE_FILE_NAME: &str = "preferences.json";

/// Settings for the preference holder and its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Key the mode is persisted under.
    pub storage_key: String,
    /// Class toggled on the document root in dark mode.
    pub dark_class: String,
    /// Mode used when neither storage nor the OS decide.
    pub default_mode: ColorMode,
    /// Explicit preference file; overrides directory lookup.
    pub store_path: Option<PathBuf>,
    /// YAML palette overrides.
    pub palette_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            dark_class: "dark".to_string(),
            default_mode: ColorMode::Light,
            store_path: None,
            palette_path: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self, ThemeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ThemeError::io(path, e))?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(base) = path.parent() {
            config.store_path = config.store_path.map(|p| anchor(base, p));
            config.palette_path = config.palette_path.map(|p| anchor(base, p));
        }
        Ok(config)
    }

    /// Loads the file named by `UMBRA_CONFIG`, or the defaults when unset.
    pub fn from_env(vars: &dyn EnvReader) -> Result<Self, ThemeError> {
        match vars.var(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Where the preference file lives, if anywhere.
    ///
    /// In order: the explicit `store_path`, `$UMBRA_HOME/preferences.json`,
    /// `$XDG_CONFIG_HOME/umbra/preferences.json`,
    /// `$HOME/.config/umbra/preferences.json`.
    pub fn resolve_store_path(&self, vars: &dyn EnvReader) -> Option<PathBuf> {
        if let Some(path) = &self.store_path {
            return Some(path.clone());
        }
        if let Some(home) = vars.var(HOME_ENV) {
            return Some(PathBuf::from(home).join(STORE_FILE_NAME));
        }
        if let Some(xdg) = vars.var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("umbra").join(STORE_FILE_NAME));
        }
        vars.var("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("umbra")
                .join(STORE_FILE_NAME)
        })
    }

    fn validate(&self) -> Result<(), ThemeError> {
        if self.storage_key.trim().is_empty() {
            return Err(ThemeError::Config("storage_key must not be empty".into()));
        }
        if self.dark_class.trim().is_empty() || self.dark_class.contains(char::is_whitespace) {
            return Err(ThemeError::Config(format!(
                "dark_class must be a single class name, got '{}'",
                self.dark_class
            )));
        }
        Ok(())
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
