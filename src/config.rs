//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/btbookmarks/btbookmarks.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `BTBOOKMARKS_*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::ModuleType;

/// Name of the bookmark file inside the user base directory.
pub const BOOKMARKS_FILE_NAME: &str = "bookmarks.xml";

/// Delay between the first unsaved change and the automatic save.
pub const DEFAULT_SAVE_DELAY_SECS: u64 = 30;

/// An installed module as declared in the settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub module_type: ModuleType,
    #[serde(default)]
    pub description: String,
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_dir: Option<PathBuf>,
    pub bookmarks_file: Option<PathBuf>,
    pub save_delay_secs: Option<u64>,
    pub booknames_locale: Option<String>,
    pub modules: Option<Vec<ModuleConfig>>,
}

/// Unified configuration for btbookmarks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// User base directory (default: ~/.bibletime)
    pub base_dir: PathBuf,
    /// Bookmark file; `<base_dir>/bookmarks.xml` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarks_file: Option<PathBuf>,
    /// Debounce delay for automatic saves of the default store
    pub save_delay_secs: u64,
    /// Language used to render verse keys
    pub booknames_locale: String,
    /// Installed modules
    pub modules: Vec<ModuleConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: dirs_default_base_dir(),
            bookmarks_file: None,
            save_delay_secs: DEFAULT_SAVE_DELAY_SECS,
            booknames_locale: "en".into(),
            modules: Vec::new(),
        }
    }
}

/// Get the default base directory (~/.bibletime).
fn dirs_default_base_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".bibletime"))
        .unwrap_or_else(|| PathBuf::from("~/.bibletime"))
}

/// Get the XDG config directory for btbookmarks.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "btbookmarks").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("btbookmarks.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Location of the default bookmark file.
    pub fn bookmarks_path(&self) -> PathBuf {
        self.bookmarks_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join(BOOKMARKS_FILE_NAME))
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_secs(self.save_delay_secs)
    }

    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.base_dir.to_string_lossy().as_ref());
        self.base_dir = PathBuf::from(expanded);

        if let Some(file) = &self.bookmarks_file {
            self.bookmarks_file = Some(PathBuf::from(expand_env_vars(
                file.to_string_lossy().as_ref(),
            )));
        }
    }

    /// Overlay wins wherever it specifies a value. Module lists replace.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            base_dir: overlay
                .base_dir
                .clone()
                .unwrap_or_else(|| self.base_dir.clone()),
            bookmarks_file: overlay
                .bookmarks_file
                .clone()
                .or_else(|| self.bookmarks_file.clone()),
            save_delay_secs: overlay.save_delay_secs.unwrap_or(self.save_delay_secs),
            booknames_locale: overlay
                .booknames_locale
                .clone()
                .unwrap_or_else(|| self.booknames_locale.clone()),
            modules: overlay
                .modules
                .clone()
                .unwrap_or_else(|| self.modules.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file, applied after the global one
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load settings from a single TOML file on top of the compiled defaults.
    ///
    /// Ignores the global config and the environment.
    pub fn from_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().merge_with(&raw);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply BTBOOKMARKS_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("BTBOOKMARKS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("base_dir") {
            settings.base_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("bookmarks_file") {
            settings.bookmarks_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<u64>("save_delay_secs") {
            settings.save_delay_secs = val;
        }
        if let Ok(val) = config.get_string("booknames_locale") {
            settings.booknames_locale = val;
        }

        Ok(settings)
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bookmarks_path_defaults_into_base_dir() {
        let settings = Settings {
            base_dir: PathBuf::from("/home/u/.bibletime"),
            ..Settings::default()
        };
        assert_eq!(
            settings.bookmarks_path(),
            PathBuf::from("/home/u/.bibletime/bookmarks.xml")
        );
    }

    #[test]
    fn merge_keeps_base_values_the_overlay_leaves_out() {
        let base = Settings::default();
        let overlay = RawSettings {
            save_delay_secs: Some(5),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.save_delay_secs, 5);
        assert_eq!(merged.base_dir, base.base_dir);
        assert_eq!(merged.booknames_locale, "en");
    }
}
