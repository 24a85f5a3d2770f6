//! Layered configuration loading.
//!
//! Sources, lowest to highest priority:
//!
//! 1. [`ChatclickConfig::default`]
//! 2. `chatclick.<profile>.<ext>`, when a profile is selected
//! 3. `chatclick.<ext>`, or the file passed to [`ConfigLoader::file`]
//! 4. `CHATCLICK_*` environment variables, `__` separating sections
//!    (`CHATCLICK_REPLY__ERROR_COLOR=#00FF00`)
//! 5. [`ConfigLoader::merge`] and [`ConfigLoader::set`] overrides
//!
//! Files are looked up in the current directory, then in
//! `<config_dir>/chatclick`. Only the first directory holding a chatclick
//! file is used. `<ext>` is `toml` with the `toml-config` feature and
//! `yaml`/`yml` with `yaml-config`.
//!
//! ```rust,ignore
//! let config = ConfigLoader::new()
//!     .profile("staging")
//!     .set("reply.help_pretext", "Usage")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::ChatclickConfig;
use super::validation::validate_config;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CHATCLICK_";

/// Environment variable selecting the profile file.
pub const PROFILE_VAR: &str = "CHATCLICK_PROFILE";

const FILE_STEM: &str = "chatclick";

/// Builds a [`ChatclickConfig`] from files, environment and overrides.
pub struct ConfigLoader {
    profile: Option<String>,
    dirs: Vec<PathBuf>,
    file: Option<PathBuf>,
    env: bool,
    overrides: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader; the profile comes from `CHATCLICK_PROFILE` if set.
    pub fn new() -> Self {
        Self {
            profile: std::env::var(PROFILE_VAR).ok().filter(|p| !p.is_empty()),
            dirs: Vec::new(),
            file: None,
            env: true,
            overrides: Figment::new(),
        }
    }

    /// Selects the profile whose file is layered under the main file.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into().to_lowercase());
        self
    }

    /// Searches `dir` instead of the default directories. May be repeated.
    pub fn search_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. A missing file is an
    /// error.
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Ignores `CHATCLICK_*` variables.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Overrides every field with `config`.
    pub fn merge(mut self, config: ChatclickConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Overrides a single dotted key, e.g. `reply.error_color`.
    pub fn set(mut self, key: &str, value: impl Serialize) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<ChatclickConfig> {
        let profile = self.profile.clone();
        let config: ChatclickConfig = self.figment()?.extract()?;
        validate_config(&config)?;

        debug!(
            profile = profile.as_deref().unwrap_or("-"),
            level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ChatclickConfig::default()));

        let files = match &self.file {
            Some(path) if !path.is_file() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => vec![path.clone()],
            None => self.discover(),
        };
        for path in &files {
            info!(path = %path.display(), "Reading configuration file");
            figment = merge_file(figment, path)?;
        }

        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Config files of the first directory that has any, profile file first.
    fn discover(&self) -> Vec<PathBuf> {
        let dirs = if self.dirs.is_empty() {
            default_dirs()
        } else {
            self.dirs.clone()
        };
        let exts = extensions();

        for dir in dirs {
            let profile_files = self.profile.iter().flat_map(|profile| {
                exts.iter()
                    .map(move |ext| format!("{FILE_STEM}.{profile}.{ext}"))
            });
            let base_files = exts.iter().map(|ext| format!("{FILE_STEM}.{ext}"));

            let found: Vec<PathBuf> = profile_files
                .chain(base_files)
                .map(|name| dir.join(name))
                .filter(|path| path.is_file())
                .collect();
            if !found.is_empty() {
                return found;
            }
        }
        debug!("No configuration file found");
        Vec::new()
    }
}

fn default_dirs() -> Vec<PathBuf> {
    std::env::current_dir()
        .ok()
        .into_iter()
        .chain(dirs::config_dir().map(|dir| dir.join(FILE_STEM)))
        .collect()
}

#[allow(unused_mut)]
fn extensions() -> Vec<&'static str> {
    let mut exts = Vec::new();
    #[cfg(feature = "toml-config")]
    exts.push("toml");
    #[cfg(feature = "yaml-config")]
    exts.extend(["yaml", "yml"]);
    exts
}

#[allow(unused_variables)]
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    match path.extension().and_then(|ext| ext.to_str()) {
        #[cfg(feature = "toml-config")]
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "unsupported configuration file: {}",
            path.display()
        ))),
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<ChatclickConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path`, with environment overrides.
pub fn load_config_from_file(path: impl AsRef<Path>) -> ConfigResult<ChatclickConfig> {
    ConfigLoader::new().file(path).load()
}
