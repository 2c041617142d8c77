//! Runtime configuration.
//!
//! Precedence: explicit values (`with_*`) > environment > config file > defaults.
//! Config files are searched at `$ODM_CONFIG`, `<config dir>/odm-lite.toml` and
//! `./odm-lite.toml`; for each setting the first file that names it wins.

use crate::errors::OdmError;
use crate::store::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "odm-lite.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdmConfig {
    pub project_key: Option<String>,
    pub page_size: usize,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self { project_key: None, page_size: DEFAULT_PAGE_SIZE, log_dir: None, log_level: None }
    }
}

/// One source of settings; unset entries fall through to the next source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Layer {
    project_key: Option<String>,
    page_size: Option<usize>,
    log_dir: Option<PathBuf>,
    log_level: Option<String>,
}

impl Layer {
    fn or(self, lower: Self) -> Self {
        Self {
            project_key: self.project_key.or(lower.project_key),
            page_size: self.page_size.or(lower.page_size),
            log_dir: self.log_dir.or(lower.log_dir),
            log_level: self.log_level.or(lower.log_level),
        }
    }

    fn parse(text: &str) -> Result<Self, OdmError> {
        toml::from_str(text).map_err(|e| OdmError::Configuration(format!("invalid config file: {e}")))
    }

    fn from_env(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, OdmError> {
        let page_size = match lookup("ODM_PAGE_SIZE") {
            Some(s) => Some(s.trim().parse::<usize>().map_err(|e| {
                OdmError::Configuration(format!("ODM_PAGE_SIZE must be a positive integer ('{s}'): {e}"))
            })?),
            None => None,
        };
        Ok(Self {
            project_key: lookup("PROJECT_KEY"),
            page_size,
            log_dir: lookup("ODM_LOG_DIR").map(PathBuf::from),
            log_level: lookup("ODM_LOG_LEVEL"),
        })
    }

    fn finish(self) -> Result<OdmConfig, OdmError> {
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(OdmError::Configuration("page_size must be at least 1".into()));
        }
        Ok(OdmConfig {
            project_key: self.project_key,
            page_size,
            log_dir: self.log_dir,
            log_level: self.log_level,
        })
    }
}

impl OdmConfig {
    /// Resolve configuration from the process environment and the standard config files.
    /// `explicit` is searched before all other files.
    ///
    /// # Errors
    /// `Io` for an unreadable config file, `Configuration` for malformed contents.
    pub fn load(explicit: Option<&Path>) -> Result<Self, OdmError> {
        let env = |name: &str| std::env::var(name).ok();
        let paths = Self::candidate_paths(explicit, &env);
        Self::load_from(&paths, &env)
    }

    /// Resolve configuration from `paths` (in priority order) and the `env` lookup.
    ///
    /// # Errors
    /// See [`OdmConfig::load`].
    pub fn load_from(paths: &[PathBuf], env: &dyn Fn(&str) -> Option<String>) -> Result<Self, OdmError> {
        let mut files = Layer::default();
        for path in paths.iter().filter(|p| p.is_file()) {
            let text = std::fs::read_to_string(path)
                .map_err(|e| OdmError::Io(format!("reading {}: {e}", path.display())))?;
            log::debug!("loaded config file {}", path.display());
            files = files.or(Layer::parse(&text)?);
        }
        Layer::from_env(env)?.or(files).finish()
    }

    /// Parse a TOML document; missing settings take their defaults.
    ///
    /// # Errors
    /// `Configuration` for malformed TOML or an invalid value.
    pub fn from_toml_str(text: &str) -> Result<Self, OdmError> {
        Layer::parse(text)?.finish()
    }

    #[must_use]
    pub fn candidate_paths(explicit: Option<&Path>, env: &dyn Fn(&str) -> Option<String>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        paths.extend(explicit.map(Path::to_path_buf));
        paths.extend(env("ODM_CONFIG").map(PathBuf::from));
        paths.extend(dirs_next::config_dir().map(|d| d.join(CONFIG_FILE_NAME)));
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        paths
    }

    #[must_use]
    pub fn with_project_key(mut self, key: impl Into<String>) -> Self {
        self.project_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// The project key, validated as `<project id>_<secret>`.
    ///
    /// # Errors
    /// `Configuration` when the key is absent, blank or malformed.
    pub fn require_project_key(&self) -> Result<&str, OdmError> {
        let key = self.project_key.as_deref().map(str::trim).unwrap_or_default();
        if key.is_empty() {
            return Err(OdmError::Configuration(
                "project key is not set (PROJECT_KEY or `project_key` in odm-lite.toml)".into(),
            ));
        }
        match key.split_once('_') {
            Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Ok(key),
            _ => Err(OdmError::Configuration("project key must look like <project id>_<secret>".into())),
        }
    }

    /// # Errors
    /// See [`OdmConfig::require_project_key`].
    pub fn project_id(&self) -> Result<&str, OdmError> {
        let key = self.require_project_key()?;
        Ok(key.split_once('_').map_or(key, |(id, _)| id))
    }
}
